//! Sandbox hosted in a child process.
//!
//! The parent spawns `<program> --worker` and exchanges one JSON object per
//! line over the child's stdio. The child keeps a single Boa context for its
//! whole life, so one child is one sandbox. Dropping the [`ProcessSandbox`]
//! kills the child.

use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

use serde::{Deserialize, Serialize};

use super::boa::BoaSandbox;
use super::{Interpreter, Sandbox, ScriptLimits};
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerOp {
    Run,
    Eval,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WorkerRequest {
    pub id: u64,
    pub op: WorkerOp,
    pub code: String,
    pub loop_limit: u64,
    pub recursion_limit: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WorkerResponse {
    pub id: u64,
    pub value: String,
    pub is_error: bool,
}

pub struct ProcessSandbox {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    limits: ScriptLimits,
    next_id: u64,
}

impl ProcessSandbox {
    /// Spawn `program --worker`.
    pub fn spawn(program: &Path, limits: ScriptLimits) -> Result<Self> {
        let mut child = Command::new(program)
            .arg("--worker")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .spawn()
            .map_err(|e| {
                Error::Script(format!("failed to spawn worker {}: {}", program.display(), e))
            })?;

        let stdin = child.stdin.take();
        let stdout = child.stdout.take();
        let (stdin, stdout) = match (stdin, stdout) {
            (Some(i), Some(o)) => (i, o),
            _ => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(Error::Script("worker stdio was not captured".into()));
            }
        };

        log::debug!("spawned latex worker pid={}", child.id());
        Ok(Self {
            child,
            stdin,
            stdout: BufReader::new(stdout),
            limits,
            next_id: 1,
        })
    }

    fn request(&mut self, op: WorkerOp, code: &str) -> Result<String> {
        let id = self.next_id;
        self.next_id += 1;
        let req = WorkerRequest {
            id,
            op,
            code: code.to_string(),
            loop_limit: self.limits.loop_iteration_limit,
            recursion_limit: self.limits.recursion_limit,
        };
        let line = serde_json::to_string(&req)
            .map_err(|e| Error::Script(format!("failed to encode worker job: {}", e)))?;
        writeln!(self.stdin, "{}", line)
            .map_err(|e| Error::Script(format!("worker write failed: {}", e)))?;
        self.stdin
            .flush()
            .map_err(|e| Error::Script(format!("worker write failed: {}", e)))?;

        let mut reply = String::new();
        let n = self
            .stdout
            .read_line(&mut reply)
            .map_err(|e| Error::Script(format!("failed to read worker response: {}", e)))?;
        if n == 0 {
            return Err(Error::Script("worker closed".into()));
        }
        let resp: WorkerResponse = serde_json::from_str(&reply)
            .map_err(|_| {
                Error::Script(format!("malformed worker response: {}", reply.trim_end()))
            })?;
        if resp.id != id {
            return Err(Error::Script(format!(
                "worker answered job {} while {} was pending",
                resp.id, id
            )));
        }
        if resp.is_error {
            Err(Error::Script(resp.value))
        } else {
            Ok(resp.value)
        }
    }
}

impl Sandbox for ProcessSandbox {
    fn interpreter(&self) -> Interpreter {
        Interpreter::Boa
    }

    fn tolerates_known_bundle_fault(&self) -> bool {
        false
    }

    fn run(&mut self, source: &str) -> Result<()> {
        self.request(WorkerOp::Run, source).map(|_| ())
    }

    fn eval_string(&mut self, expr: &str) -> Result<String> {
        self.request(WorkerOp::Eval, expr)
    }
}

impl Drop for ProcessSandbox {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

// Reuse the worker's context, creating it on the first job.
fn prepare(slot: &mut Option<BoaSandbox>, limits: ScriptLimits) -> Result<&mut BoaSandbox> {
    let sb = match slot.take() {
        Some(mut sb) => {
            sb.apply_limits(limits);
            sb
        }
        None => BoaSandbox::new(limits)?,
    };
    Ok(slot.insert(sb))
}

/// Worker side of the protocol: answer every request line from `input` on
/// `output` until EOF. Blank and malformed lines are skipped.
pub fn run_worker<R: BufRead, W: Write>(input: R, mut output: W) -> io::Result<()> {
    let mut sandbox: Option<BoaSandbox> = None;

    for line in input.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let job = match serde_json::from_str::<WorkerRequest>(&line) {
            Ok(job) => job,
            Err(e) => {
                log::warn!("ignoring malformed worker request: {}", e);
                continue;
            }
        };
        let limits = ScriptLimits {
            loop_iteration_limit: job.loop_limit,
            recursion_limit: job.recursion_limit,
        };

        let outcome = prepare(&mut sandbox, limits).and_then(|sb| match job.op {
            WorkerOp::Run => sb.run(&job.code).map(|_| String::new()),
            WorkerOp::Eval => sb.eval_string(&job.code),
        });

        let resp = match outcome {
            Ok(value) => WorkerResponse { id: job.id, value, is_error: false },
            Err(Error::Script(msg)) => WorkerResponse { id: job.id, value: msg, is_error: true },
            Err(e) => WorkerResponse { id: job.id, value: e.to_string(), is_error: true },
        };
        let js = serde_json::to_string(&resp).unwrap_or_else(|_| {
            format!("{{\"id\":{},\"value\":\"serialization failed\",\"is_error\":true}}", job.id)
        });
        writeln!(output, "{}", js)?;
        output.flush()?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn job(id: u64, op: WorkerOp, code: &str) -> String {
        serde_json::to_string(&WorkerRequest {
            id,
            op,
            code: code.into(),
            loop_limit: 0,
            recursion_limit: usize::MAX,
        })
        .unwrap()
    }

    fn replies(input: String) -> Vec<WorkerResponse> {
        let mut out = Vec::new();
        run_worker(Cursor::new(input), &mut out).expect("worker loop");
        String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).expect("reply json"))
            .collect()
    }

    #[test]
    fn worker_keeps_one_context_across_jobs() {
        let input = format!(
            "{}\n{}\n",
            job(1, WorkerOp::Run, "var x = 'kept';"),
            job(2, WorkerOp::Eval, "x")
        );
        let r = replies(input);
        assert_eq!(r.len(), 2);
        assert!(!r[0].is_error);
        assert_eq!(r[1].id, 2);
        assert_eq!(r[1].value, "kept");
    }

    #[test]
    fn worker_reports_thrown_errors() {
        let r = replies(format!("{}\n", job(7, WorkerOp::Run, "throw new TypeError('bad')")));
        assert_eq!(r.len(), 1);
        assert!(r[0].is_error);
        assert!(r[0].value.contains("bad"));
    }

    #[test]
    fn worker_skips_blank_and_malformed_lines() {
        let input = format!("\n{{not json}}\n{}\n", job(3, WorkerOp::Eval, "1 + 1"));
        let r = replies(input);
        assert_eq!(r.len(), 1);
        assert_eq!(r[0].id, 3);
        assert_eq!(r[0].value, "2");
    }

    #[test]
    fn ops_serialize_lowercase() {
        let line = job(1, WorkerOp::Eval, "0");
        assert!(line.contains("\"op\":\"eval\""));
    }
}
