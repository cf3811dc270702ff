use super::*;

fn ms(value: u64) -> Duration {
    Duration::from_millis(value)
}

#[test]
fn default_policy_matches_screen_convention() {
    let policy = DebouncePolicy::default();
    assert_eq!(policy.delay, ms(300));
    assert!(policy.supersede_in_flight);
}

#[test]
fn coalescer_releases_only_after_quiet_window() {
    let start = Instant::now();
    let mut coalescer = Coalescer::new(ms(300));

    coalescer.push("shoe", start);
    coalescer.push("shirt", start + ms(100));
    assert_eq!(coalescer.poll(start + ms(350)), None);
    assert_eq!(coalescer.deadline(), Some(start + ms(400)));
    assert_eq!(coalescer.poll(start + ms(400)), Some("shirt"));
    assert!(coalescer.is_idle());
    assert_eq!(coalescer.poll(start + ms(900)), None);
}

#[test]
fn flush_returns_pending_value_immediately() {
    let mut coalescer = Coalescer::new(ms(300));
    coalescer.push(1, Instant::now());
    assert_eq!(coalescer.flush(), Some(1));
    assert_eq!(coalescer.deadline(), None);
}

#[tokio::test(start_paused = true)]
async fn burst_is_released_once_with_last_value() {
    let (tx, rx) = mpsc::unbounded_channel();
    let (mut released, _task) = spawn_debouncer(DebouncePolicy::default(), rx);

    for value in ["s", "sh", "shi", "shir", "shirt"] {
        tx.send(value).expect("send");
        tokio::time::sleep(ms(50)).await;
    }

    assert_eq!(released.recv().await, Some("shirt"));
    tokio::time::sleep(ms(1000)).await;
    assert!(released.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn separated_changes_are_released_individually() {
    let (tx, rx) = mpsc::unbounded_channel();
    let (mut released, _task) = spawn_debouncer(DebouncePolicy::default(), rx);

    tx.send(1).expect("send");
    assert_eq!(released.recv().await, Some(1));
    tokio::time::sleep(ms(500)).await;
    tx.send(2).expect("send");
    assert_eq!(released.recv().await, Some(2));
}

#[tokio::test(start_paused = true)]
async fn pending_value_is_flushed_when_input_closes() {
    let (tx, rx) = mpsc::unbounded_channel();
    let (mut released, task) = spawn_debouncer(DebouncePolicy::with_delay(ms(10_000)), rx);

    tx.send("last").expect("send");
    drop(tx);

    assert_eq!(released.recv().await, Some("last"));
    assert_eq!(released.recv().await, None);
    task.await.expect("debouncer task");
}

#[tokio::test]
async fn zero_delay_forwards_every_value() {
    let (tx, rx) = mpsc::unbounded_channel();
    let (mut released, _task) = spawn_debouncer(DebouncePolicy::immediate(), rx);

    tx.send(1).expect("send");
    assert_eq!(released.recv().await, Some(1));
    tx.send(2).expect("send");
    assert_eq!(released.recv().await, Some(2));
}
