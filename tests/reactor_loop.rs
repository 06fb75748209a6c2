mod common;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use common::{at, router, ExecLog, ScriptedClassifier, RecordingExecutor};
use murmur::kernel::event::{Event, InputEvent, SideEffect};
use murmur::kernel::time::ManualClock;
use murmur::Reactor;

type TestReactor = Reactor<RecordingExecutor, ScriptedClassifier>;

fn reactor() -> (mpsc::Sender<Event>, TestReactor, Arc<ManualClock>, ExecLog) {
    let (tx, rx) = mpsc::channel(100);
    let (router, log) = router();
    let clock = Arc::new(ManualClock::new(at(0.0)));
    let reactor = Reactor::with_clock(rx, router, Box::new(Arc::clone(&clock)));
    (tx, reactor, clock, log)
}

fn say(text: &str) -> Event {
    Event::Input(InputEvent::utterance("Test", text))
}

fn speech(effects: &[SideEffect]) -> Vec<&str> {
    effects.iter().filter_map(SideEffect::spoken_text).collect()
}

#[tokio::test]
async fn test_tick_step_routes_queued_input() {
    let (tx, mut reactor, _clock, log) = reactor();

    tx.send(say("volume up")).await.unwrap();
    tx.send(say("four")).await.unwrap();

    let events = reactor.drain();
    assert_eq!(events.len(), 2);
    let effects = reactor.tick_step(events);

    // VERIFY: both utterances handled in arrival order within one step
    assert_eq!(speech(&effects), vec!["How much?", "Increasing volume"]);
    assert_eq!(log.last().and_then(|(_, e)| e.steps()), Some(4));
    assert!(effects
        .iter()
        .any(|e| matches!(e, SideEffect::Log(msg) if msg == "Clarification -> Executed")));
}

#[tokio::test]
async fn test_due_tasks_run_before_inputs() {
    let (tx, mut reactor, clock, log) = reactor();

    // 1. Schedule at t=0
    tx.send(say("open spotify in 5 seconds")).await.unwrap();
    let events = reactor.drain();
    reactor.tick_step(events);
    assert_eq!(log.count(), 0);

    // 2. At t=5 a new command arrives in the same step the task comes due
    clock.advance(Duration::from_secs(5));
    tx.send(say("open notepad")).await.unwrap();
    let events = reactor.drain();
    let effects = reactor.tick_step(events);

    // VERIFY: the deferred task went first
    let apps: Vec<String> = log
        .calls()
        .iter()
        .filter_map(|(_, e)| e.app().map(str::to_string))
        .collect();
    assert_eq!(apps, vec!["spotify".to_string(), "notepad".to_string()]);
    assert_eq!(speech(&effects), vec!["Opening spotify", "Opening notepad"]);
    assert!(matches!(&effects[0], SideEffect::Log(msg) if msg == "1 scheduled task(s) fired"));
}

#[tokio::test]
async fn test_cancel_task_event() {
    let (tx, mut reactor, clock, log) = reactor();

    tx.send(say("mute in 10 seconds")).await.unwrap();
    let events = reactor.drain();
    reactor.tick_step(events);
    assert_eq!(reactor.router.scheduler().count(), 1);

    tx.send(Event::CancelTask { task_id: 1 }).await.unwrap();
    let events = reactor.drain();
    let effects = reactor.tick_step(events);
    assert!(effects
        .iter()
        .any(|e| matches!(e, SideEffect::Log(msg) if msg == "cancel task 1: removed=true")));
    assert_eq!(reactor.router.scheduler().count(), 0);

    clock.advance(Duration::from_secs(20));
    reactor.tick_step(Vec::new());
    assert_eq!(log.count(), 0, "cancelled task must never fire");
}

#[tokio::test]
async fn test_silence_event() {
    let (tx, mut reactor, _clock, _log) = reactor();
    tx.send(say("murmur")).await.unwrap();
    tx.send(Event::Input(InputEvent::silence("Test"))).await.unwrap();

    let events = reactor.drain();
    let effects = reactor.tick_step(events);
    assert_eq!(speech(&effects), vec!["I am here.", "I didn't catch that."]);
}

#[tokio::test]
async fn test_run_stops_when_input_closes() {
    let (tx, mut reactor, _clock, log) = reactor();
    tx.send(say("open chrome")).await.unwrap();
    drop(tx);

    tokio::time::timeout(Duration::from_secs(5), reactor.run())
        .await
        .expect("reactor should stop once the channel is closed");
    assert_eq!(log.count(), 1);
}
