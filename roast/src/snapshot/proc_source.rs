use std::fs;

use procfs::process::Process;
use tracing::warn;

use super::{Snapshot, SnapshotSource, SourceError, ThreadStack};
use crate::calltree::Frame;

/// qualifier used for kernel symbols that don't belong to a module
const KERNEL: &str = "kernel";

/// Samples the kernel-side stacks of every task of a live Linux process through `/proc`.
pub struct ProcSource {
    process: Process,
}

impl ProcSource {
    pub fn attach(pid: i32) -> Result<Self, SourceError> {
        let process = Process::new(pid).map_err(|source| SourceError::Attach { pid, source })?;
        // fail now rather than on the first tick
        process
            .stat()
            .map_err(|source| SourceError::Attach { pid, source })?;
        Ok(Self { process })
    }

    pub fn pid(&self) -> i32 {
        self.process.pid
    }

    fn task_frames(&self, tid: i32) -> Vec<Frame> {
        let base = format!("/proc/{}/task/{}", self.process.pid, tid);
        if let Ok(stack) = fs::read_to_string(format!("{base}/stack")) {
            let frames = parse_kernel_stack(&stack);
            if !frames.is_empty() {
                return frames;
            }
        }

        // reading `stack` needs CAP_SYS_ADMIN, `wchan` does not
        match fs::read_to_string(format!("{base}/wchan")) {
            Ok(wchan) => parse_wchan(&wchan).into_iter().collect(),
            Err(_) => vec![],
        }
    }
}

impl SnapshotSource for ProcSource {
    fn sample(&mut self) -> Option<Snapshot> {
        let tasks = self.process.tasks().ok()?;
        let mut snapshot = Snapshot::new();
        for task in tasks {
            // a task that died mid-enumeration is simply missing from this snapshot
            let Ok(task) = task else { continue };
            let comm = match task.stat() {
                Ok(stat) => stat.comm,
                Err(e) => {
                    warn!("unable to read task {}: {}", task.tid, e);
                    continue;
                }
            };
            let frames = self.task_frames(task.tid);
            snapshot.push(ThreadStack::new(comm, frames));
        }

        if snapshot.is_empty() {
            None
        } else {
            Some(snapshot)
        }
    }
}

/// parse `/proc/<pid>/task/<tid>/stack`, which lists the innermost frame first
pub(crate) fn parse_kernel_stack(stack: &str) -> Vec<Frame> {
    let mut frames = stack.lines().filter_map(parse_kernel_frame).collect::<Vec<_>>();
    frames.reverse();
    frames
}

/// `[<0>] ep_poll+0x2a3/0x340 [module]`
fn parse_kernel_frame(line: &str) -> Option<Frame> {
    let mut parts = line.split_whitespace();
    let mut sym = parts.next()?;
    if sym.starts_with("[<") {
        sym = parts.next()?;
    }
    let sym = sym.split('+').next().filter(|s| !s.is_empty())?;
    let module = parts
        .next()
        .and_then(|m| m.strip_prefix('['))
        .and_then(|m| m.strip_suffix(']'))
        .unwrap_or(KERNEL);
    Some(Frame::new(module, sym))
}

fn parse_wchan(wchan: &str) -> Option<Frame> {
    let sym = wchan.trim();
    if sym.is_empty() || sym == "0" {
        None
    } else {
        Some(Frame::new(KERNEL, sym))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_kernel_stack() {
        let stack = "[<0>] ep_poll+0x2a3/0x340\n\
                     [<0>] nfs_wait+0x10/0x20 [nfs]\n\
                     [<0>] do_syscall_64+0x5c/0x90\n\
                     [<0>] entry_SYSCALL_64_after_hwframe+0x72/0xdc\n";
        let frames = parse_kernel_stack(stack);
        assert_eq!(
            frames,
            vec![
                Frame::new("kernel", "entry_SYSCALL_64_after_hwframe"),
                Frame::new("kernel", "do_syscall_64"),
                Frame::new("nfs", "nfs_wait"),
                Frame::new("kernel", "ep_poll"),
            ]
        );
    }

    #[test]
    fn test_parse_garbage_lines() {
        assert!(parse_kernel_stack("\n[<0>]\n").is_empty());
    }

    #[test]
    fn test_parse_wchan() {
        assert_eq!(parse_wchan("0"), None);
        assert_eq!(parse_wchan(""), None);
        assert_eq!(parse_wchan("futex_wait_queue\n"), Some(Frame::new("kernel", "futex_wait_queue")));
    }

    #[test]
    fn test_attach_to_self() {
        let mut src = ProcSource::attach(std::process::id() as i32).unwrap();
        let snapshot = src.sample().unwrap();
        assert!(!snapshot.is_empty());
    }

    #[test]
    fn test_attach_to_missing_process() {
        assert!(matches!(
            ProcSource::attach(i32::MAX),
            Err(SourceError::Attach { .. })
        ));
    }
}
