// tests/supervisor.rs
//! Worker pool lifecycle

mod common;

use aqua_miner_rs::miner::{DeviceFactory, HashSearch, Supervisor};
use aqua_miner_rs::{MinerError, MiningMode};
use common::*;
use std::sync::{Arc, Mutex};

fn scripted_factory(opened: Arc<Mutex<Vec<usize>>>) -> DeviceFactory {
    Arc::new(move |index| {
        opened.lock().unwrap().push(index);
        let (search, _) = ScriptedSearch::new(&[]);
        Ok(Box::new(search) as Box<dyn HashSearch>)
    })
}

fn stopped_rig() -> Rig {
    let rig = Rig::new(RigOptions {
        mode: MiningMode::Pool,
        batch_size: 16,
        ..Default::default()
    });
    rig.ctx.run.store(false, std::sync::atomic::Ordering::SeqCst);
    rig
}

#[test]
fn start_twice_is_already_running_and_stop_twice_is_not_running() {
    let rig = stopped_rig();
    rig.feed.publish(easy_job(1));
    let opened = Arc::new(Mutex::new(Vec::new()));
    let supervisor = Supervisor::new(rig.ctx.clone(), scripted_factory(opened.clone()));

    supervisor.start(3).unwrap();
    assert!(supervisor.is_running());
    assert!(matches!(supervisor.start(1), Err(MinerError::AlreadyRunning)));

    assert!(wait_until(|| {
        supervisor.worker_summaries().iter().all(|w| w.hashes > 0)
    }));
    let tags: Vec<String> = supervisor
        .worker_summaries()
        .into_iter()
        .map(|w| w.tag)
        .collect();
    assert_eq!(tags, ["MINER_00", "MINER_01", "MINER_02"]);

    supervisor.stop().unwrap();
    assert!(!supervisor.is_running());
    assert!(matches!(supervisor.stop(), Err(MinerError::NotRunning)));

    let mut opened = opened.lock().unwrap().clone();
    opened.sort();
    assert_eq!(opened, [0, 1, 2]);

    // Joined workers no longer count.
    let frozen = rig.counters.total_hashes_computed();
    std::thread::sleep(std::time::Duration::from_millis(20));
    assert_eq!(rig.counters.total_hashes_computed(), frozen);
}

#[test]
fn stop_without_start_is_a_no_op() {
    let rig = stopped_rig();
    let opened = Arc::new(Mutex::new(Vec::new()));
    let supervisor = Supervisor::new(rig.ctx.clone(), scripted_factory(opened.clone()));

    assert!(supervisor.stop().unwrap().is_empty());
    assert!(supervisor.stop().unwrap().is_empty());
    assert!(!supervisor.is_running());
    assert!(opened.lock().unwrap().is_empty());

    // The pool is still usable afterwards.
    rig.feed.publish(easy_job(4));
    supervisor.start(1).unwrap();
    supervisor.stop().unwrap();
    assert!(matches!(supervisor.stop(), Err(MinerError::NotRunning)));
}

#[test]
fn stop_reports_totals_including_the_last_batch() {
    let rig = stopped_rig();
    rig.feed.publish(easy_job(5));
    let supervisor = Supervisor::new(rig.ctx.clone(), scripted_factory(Arc::default()));

    supervisor.start(2).unwrap();
    assert!(wait_until(|| {
        supervisor.worker_summaries().iter().all(|w| w.hashes > 0)
    }));
    let summaries = supervisor.stop().unwrap();

    assert_eq!(summaries.len(), 2);
    let reported: u64 = summaries.iter().map(|w| w.hashes).sum();
    assert_eq!(reported, rig.counters.total_hashes_computed());
    assert!(summaries.iter().all(|w| w.hashes % 16 == 0));
}

#[test]
fn failing_device_does_not_take_down_the_pool() {
    let rig = stopped_rig();
    rig.feed.publish(easy_job(2));
    let factory: DeviceFactory = Arc::new(|index| {
        if index == 0 {
            return Err(MinerError::InputError("no such device".into()));
        }
        let (search, _) = ScriptedSearch::new(&[]);
        Ok(Box::new(search) as Box<dyn HashSearch>)
    });
    let supervisor = Supervisor::new(rig.ctx.clone(), factory);

    supervisor.start(2).unwrap();
    assert!(wait_until(|| supervisor.worker_summaries()[1].hashes > 0));
    assert_eq!(supervisor.worker_summaries()[0].hashes, 0);
    supervisor.stop().unwrap();
}

#[test]
fn restart_after_stop_is_allowed() {
    let rig = stopped_rig();
    rig.feed.publish(easy_job(3));
    let supervisor = Supervisor::new(rig.ctx.clone(), scripted_factory(Arc::default()));

    supervisor.start(1).unwrap();
    supervisor.stop().unwrap();
    supervisor.start(1).unwrap();
    assert!(supervisor.is_running());
    supervisor.stop().unwrap();
}
