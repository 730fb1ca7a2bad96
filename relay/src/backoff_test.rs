use super::*;

#[test]
fn default_policy_yields_exact_doubling_sequence() {
    let mut backoff = Backoff::new(Duration::from_millis(1000), 5);

    let delays: Vec<u64> = std::iter::from_fn(|| backoff.next_delay())
        .map(|d| u64::try_from(d.as_millis()).expect("delay fits u64"))
        .collect();

    assert_eq!(delays, vec![1000, 2000, 4000, 8000, 16000]);
}

#[test]
fn sixth_failure_schedules_nothing() {
    let mut backoff = Backoff::new(Duration::from_millis(1000), 5);
    for _ in 0..5 {
        assert!(backoff.next_delay().is_some());
    }

    assert!(backoff.exhausted());
    assert_eq!(backoff.next_delay(), None);
    assert_eq!(backoff.next_delay(), None);
    assert_eq!(backoff.attempts(), 5);
}

#[test]
fn reset_restarts_the_sequence() {
    let mut backoff = Backoff::new(Duration::from_millis(100), 3);
    assert_eq!(backoff.next_delay(), Some(Duration::from_millis(100)));
    assert_eq!(backoff.next_delay(), Some(Duration::from_millis(200)));

    backoff.reset();
    assert_eq!(backoff.attempts(), 0);
    assert_eq!(backoff.next_delay(), Some(Duration::from_millis(100)));
}

#[test]
fn zero_attempt_budget_is_immediately_exhausted() {
    let mut backoff = Backoff::new(Duration::from_millis(1000), 0);
    assert!(backoff.exhausted());
    assert_eq!(backoff.next_delay(), None);
}
