use std::env::args;
use std::sync::Arc;
use std::thread;

use anyhow::Result;
use roast::calltree::Frame;
use roast::render::{html, json};
use roast::sampler::{self, SamplerConfig, StopHandle};
use roast::snapshot::{ScriptedSource, ThreadStack};
use roast::{CallTree, Sampler, Symbols};

fn app(method: &str) -> Frame {
    Frame::new("pkg.App", method)
}

#[tokio::main]
async fn main() -> Result<()> {
    let test = args().nth(1).expect("no input");
    match test.as_str() {
        "scenario" => {
            let mut ct = CallTree::new();
            ct.observe("main", &[app("run"), app("loop")], 1000);
            ct.observe("main", &[app("run"), app("tick")], 1000);

            let root = ct.thread("main").expect("main thread");
            println!("{}", json::to_json(&ct, root, &Symbols::new())?);
            println!("{}", html::to_html(&ct, root, &Symbols::new()));
        }
        "sample" => {
            let snapshots = (0..5)
                .map(|i| {
                    let leaf = if i % 2 == 0 { "loop" } else { "tick" };
                    vec![
                        ThreadStack::new("main", vec![app("run"), app(leaf)]),
                        ThreadStack::new("Server thread", vec![app("serve")]),
                    ]
                })
                .collect();
            let tree = CallTree::shared();
            let config = SamplerConfig {
                interval_ms: 10,
                thread_filter: Some("main".to_owned()),
                ..Default::default()
            };
            let sampler = Sampler::new(ScriptedSource::new(snapshots), Arc::clone(&tree), config)?;
            let status = sampler.status();
            let (stop, stop_rx) = StopHandle::channel();
            let task = tokio::spawn(sampler::run(sampler, stop_rx));

            // 5 snapshots, then the source runs dry
            while status.report().skipped == 0 {
                tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            }
            stop.stop();
            let sampler = task.await??;
            eprintln!("state: {:?}", sampler.state());
            eprintln!("ticks: {}", status.report().ticks);
            print!("{}", tree.read());
        }
        "concurrent" => {
            let tree = CallTree::shared();
            let writer = {
                let tree = Arc::clone(&tree);
                thread::spawn(move || {
                    for i in 0..10_000u64 {
                        let leaf = format!("leaf{}", i % 13);
                        tree.write().observe("main", &[app("run"), app(&leaf)], 1);
                    }
                })
            };

            let mut renders = 0;
            while !writer.is_finished() {
                let tree = tree.read();
                if let Some(root) = tree.thread("main") {
                    let run = tree.children(root)[0];
                    let sum: u64 = tree.children(run).iter().map(|c| tree.get(*c).total_time).sum();
                    assert_eq!(tree.get(root).total_time, tree.get(run).total_time);
                    assert_eq!(tree.get(run).total_time, sum);
                    json::to_json(&tree, root, &Symbols::new())?;
                    renders += 1;
                }
            }
            writer.join().expect("writer panicked");
            eprintln!("consistent renders: {}", renders);
            println!("total: {}ms", tree.read().total_time());
        }
        _ => {
            panic!();
        }
    }

    Ok(())
}
