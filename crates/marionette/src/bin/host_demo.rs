//! Demo host: one owner loop, one worker script.
//!
//! The script thread never touches a widget. It attaches proxies, blocks
//! on reads, and subscribes a callable that re-enters the bridge when the
//! button fires. Run with `RUST_LOG=debug` to watch the queue work.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::thread;

use tracing_subscriber::EnvFilter;

use marionette::bridge::{
    EventBridge, ScriptCallable, ScriptValue, StageQueue, WindowProxy,
};
use marionette::ui::{Button, Widget, WidgetId, Window};
use marionette::{Host, HostConfig};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut host = Host::new(HostConfig::default());
    let queue = host.queue();
    let bridge = host.bridge();

    // Owner side: build the UI.
    let (window_id, button_id) = queue.with_stage(|stage| {
        let window_id = stage.singleton_window("main", |id| {
            let mut window = Window::new(id, "Marionette Demo");
            window.state_mut().set_size(400, 240);
            window
        });
        let button_id = stage.next_id();
        stage.add_child(window_id, Box::new(Button::new(button_id, "greet")));
        (window_id, button_id)
    });

    // The script runs on its own thread and reaches the stage only
    // through the queue.
    let script = {
        let queue = Arc::clone(&queue);
        let bridge = bridge.clone();
        thread::spawn(move || run_script(&queue, &bridge, window_id, button_id))
    };

    // Owner loop: tick until the script is done, then once more so its
    // last posts land.
    while !script.is_finished() {
        host.tick();
        thread::yield_now();
    }
    script.join().expect("script thread panicked");
    host.tick();

    // Simulate the user pressing the button twice.
    for _ in 0..2 {
        queue.with_stage(|stage| {
            if let Some(button) = stage.widget_as_mut::<Button>(button_id) {
                button.press();
            }
        });
        host.tick(); // delivers the callback
        host.tick(); // applies what the callback posted
    }

    let title = queue.with_stage(|stage| {
        stage
            .widget_as::<Window>(window_id)
            .map_or_else(String::new, |window| window.title().to_string())
    });
    let stats = host.stats();
    tracing::info!(
        "final title: {title:?} ({} ticks, {} tasks, max drain {}us)",
        stats.ticks,
        stats.tasks_executed,
        stats.max_drain_us
    );

    host.shutdown();
}

/// The "script": what an embedded scripting runtime would drive.
fn run_script(
    queue: &StageQueue,
    bridge: &EventBridge,
    window_id: WidgetId,
    button_id: WidgetId,
) {
    let window = WindowProxy::attach(queue, window_id)
        .expect("queue alive")
        .expect("window exists");

    window.set_title("Hello from a script");
    window.center();

    // Blocking read: parks this thread until the owner loop has applied
    // the two mutations above.
    let x = window.as_widget().x().expect("queue alive");
    tracing::info!("script: window centered at x={x}");

    // React to button presses by retitling the window through the proxy;
    // the callable runs on the owner thread but still goes through the
    // queue like everyone else.
    let presses = Arc::new(AtomicU32::new(0));
    let handler_window = window.clone();
    bridge
        .subscribe(
            button_id,
            "Pressed",
            ScriptValue::Callable(ScriptCallable::new(move |_arg| {
                let n = presses.fetch_add(1, Ordering::Relaxed) + 1;
                handler_window.set_title(format!("pressed {n} time(s)"));
                Ok(ScriptValue::Null)
            })),
        )
        .expect("event name known");
}
