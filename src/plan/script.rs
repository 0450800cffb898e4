//! Launcher script emission - serialization adapter over [`ExecutionPlan`]
//!
//! The generated bash script is the external launcher's contract made
//! literal: an ordered (command, device) list, a concurrency cap, and a
//! wait-for-slot poll loop. A failed job is reported and the queue keeps
//! draining; aborting the script launches no further jobs.

use crate::plan::ExecutionPlan;
use std::fmt::Write;

/// Single-quote `s` for bash, escaping embedded single quotes.
fn sh_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}

/// Render `plan` as a standalone bash script.
pub(crate) fn render(plan: &ExecutionPlan) -> String {
    let mut s = String::new();
    let _ = writeln!(s, "#!/usr/bin/env bash");
    let _ = writeln!(s, "# generated by lfads-sweep; edits will be overwritten");
    let _ = writeln!(s, "set -u");
    let _ = writeln!(s);
    let _ = writeln!(s, "MAX_CONCURRENT={}", plan.max_concurrent());
    let _ = writeln!(s, "POLL_INTERVAL={}", plan.poll_interval_secs());
    let _ = writeln!(s, "N_JOBS={}", plan.len());
    let _ = writeln!(s);
    let _ = writeln!(s, "declare -a COMMANDS DEVICES NAMES");
    for (i, job) in plan.jobs().iter().enumerate() {
        let _ = writeln!(s, "NAMES[{i}]={}", sh_quote(job.run_name()));
        let _ = writeln!(s, "COMMANDS[{i}]={}", sh_quote(job.command()));
        let device = job
            .device()
            .map_or_else(String::new, |d| d.to_string());
        let _ = writeln!(s, "DEVICES[{i}]='{device}'");
    }
    let _ = writeln!(s);
    let _ = writeln!(s, "run_job() {{");
    let _ = writeln!(s, "  local i=$1");
    let _ = writeln!(
        s,
        "  if CUDA_VISIBLE_DEVICES=\"${{DEVICES[$i]}}\" bash -c \"${{COMMANDS[$i]}}\"; then"
    );
    let _ = writeln!(s, "    echo \"[lfads-sweep] job $i (${{NAMES[$i]}}) finished\"");
    let _ = writeln!(s, "  else");
    let _ = writeln!(
        s,
        "    echo \"[lfads-sweep] job $i (${{NAMES[$i]}}) FAILED (exit $?)\" >&2"
    );
    let _ = writeln!(s, "  fi");
    let _ = writeln!(s, "}}");
    let _ = writeln!(s);
    let _ = writeln!(s, "i=0");
    let _ = writeln!(s, "while [ \"$i\" -lt \"$N_JOBS\" ]; do");
    let _ = writeln!(
        s,
        "  while [ \"$(jobs -rp | wc -l)\" -ge \"$MAX_CONCURRENT\" ]; do"
    );
    let _ = writeln!(s, "    sleep \"$POLL_INTERVAL\"");
    let _ = writeln!(s, "  done");
    let _ = writeln!(s, "  run_job \"$i\" &");
    let _ = writeln!(s, "  i=$((i + 1))");
    let _ = writeln!(s, "done");
    let _ = writeln!(s, "wait");
    let _ = writeln!(s, "echo \"[lfads-sweep] all jobs drained\"");
    s
}
