//! End-to-end session: a worker script drives the stage through proxies
//! and subscriptions while the owner loop ticks.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use parking_lot::Mutex;

use marionette::bridge::{
    ChoiceProxy, ScriptCallable, ScriptValue, WidgetProxy, WindowProxy,
};
use marionette::core::QueueError;
use marionette::ui::{Button, ChoiceBox, Widget, Window};
use marionette::{Host, HostConfig};

#[test]
fn script_session_round_trip() {
    let mut host = Host::new(HostConfig::default());
    let queue = host.queue();

    // Owner side: a window holding a button and a choice box.
    let (window_id, button_id, choice_id) = queue.with_stage(|stage| {
        let window_id = stage.singleton_window("session", |id| {
            let mut window = Window::new(id, "Session");
            window.state_mut().set_size(300, 200);
            window
        });
        let button_id = stage.next_id();
        stage.add_child(window_id, Box::new(Button::new(button_id, "go")));
        let choice_id = stage.next_id();
        stage.add_child(
            window_id,
            Box::new(ChoiceBox::new(
                choice_id,
                vec!["load".to_string(), "save".to_string(), "quit".to_string()],
            )),
        );
        (window_id, button_id, choice_id)
    });

    let deliveries = Arc::new(Mutex::new(Vec::<ScriptValue>::new()));

    // The script thread.
    let script = {
        let queue = host.queue();
        let bridge = host.bridge();
        let deliveries = Arc::clone(&deliveries);
        thread::spawn(move || {
            let window = WindowProxy::attach(&queue, window_id).unwrap().unwrap();
            let choice = ChoiceProxy::attach(&queue, choice_id).unwrap().unwrap();

            // Composite move, then a blocking read from the same thread:
            // the read queues behind the move and must observe it.
            window.as_widget().set_pos(5, 5);
            assert_eq!(window.as_widget().x(), Ok(5));

            window.center();
            choice.set_selected_index(2);
            assert_eq!(choice.selected_index(), Ok(2));

            // Watch the choice box.
            let log = Arc::clone(&deliveries);
            bridge
                .subscribe(
                    choice_id,
                    "Selected",
                    ScriptValue::Callable(ScriptCallable::new(move |arg| {
                        log.lock().push(arg);
                        Ok(ScriptValue::Null)
                    })),
                )
                .unwrap();
        })
    };

    while !script.is_finished() {
        host.tick();
        thread::yield_now();
    }
    script.join().unwrap();
    host.tick(); // binds the subscription

    // Native side: the user picks two entries before the next drain.
    queue.with_stage(|stage| {
        let choice = stage.widget_as_mut::<ChoiceBox>(choice_id).unwrap();
        choice.choose(0);
        choice.choose(1);
    });
    host.tick();

    assert_eq!(
        *deliveries.lock(),
        vec![ScriptValue::Int(0), ScriptValue::Int(1)]
    );

    // Nobody subscribed to the button; pressing it is harmless.
    queue.with_stage(|stage| {
        stage.widget_as_mut::<Button>(button_id).unwrap().press();
    });
    host.tick();
    assert_eq!(deliveries.lock().len(), 2);

    // The window really was centered against the 1280x720 viewport.
    queue.with_stage(|stage| {
        let rect = stage.widget(window_id).unwrap().state().rect;
        assert_eq!((rect.x, rect.y), (490, 260));
    });

    let stats = host.stats();
    assert!(stats.ticks >= 3);
    assert!(stats.tasks_executed >= 5);
}

#[test]
fn script_survives_disposal_mid_session() {
    let mut host = Host::new(HostConfig::default());
    let queue = host.queue();

    let window_id = queue.with_stage(|stage| {
        let id = stage.next_id();
        let mut window = Window::new(id, "doomed");
        window.state_mut().set_size(100, 50);
        stage.add_root(Box::new(window));
        id
    });

    let proxy = WidgetProxy::attach(&queue, window_id).unwrap().unwrap();

    // Owner closes the window while the script still holds its proxy.
    queue.with_stage(|stage| {
        stage.dispose(window_id);
    });

    let script = {
        let proxy = proxy.clone();
        thread::spawn(move || {
            // Stale handle: mutators are no-ops, reads answer defaults.
            proxy.set_size(999, 999);
            (proxy.width(), proxy.is_live())
        })
    };

    host.run_until(|| script.is_finished());
    assert_eq!(script.join().unwrap(), (Ok(0), false));
    queue.with_stage(|stage| assert!(stage.is_empty()));
}

#[test]
fn shutdown_unblocks_a_waiting_script() {
    let host = Host::new(HostConfig::default());
    let queue = host.queue();

    let entered = Arc::new(AtomicBool::new(false));
    let script = {
        let queue = host.queue();
        let entered = Arc::clone(&entered);
        thread::spawn(move || {
            entered.store(true, Ordering::Release);
            // Nobody ever ticks; only shutdown can end this wait.
            queue.call(|stage| stage.len())
        })
    };

    while !entered.load(Ordering::Acquire) || queue.pending_count() == 0 {
        thread::yield_now();
    }
    host.shutdown();
    assert_eq!(script.join().unwrap(), Err(QueueError::ShutDown));
}

#[test]
fn bounded_reads_time_out_without_an_owner() {
    let host = Host::new(HostConfig {
        call_timeout_ms: 20,
        ..HostConfig::default()
    });
    let queue = host.queue();

    let window_id = queue.with_stage(|stage| {
        let id = stage.next_id();
        stage.add_root(Box::new(Window::new(id, "slow")));
        id
    });

    // Attach on the owner thread (inline), then hand the proxy over.
    let proxy = WidgetProxy::attach(&queue, window_id)
        .unwrap()
        .unwrap()
        .with_timeout(host.config().call_timeout());

    let script = thread::spawn(move || proxy.x());

    // The owner never ticks while the script waits.
    assert_eq!(script.join().unwrap(), Err(QueueError::Timeout));
}
