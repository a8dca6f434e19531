use std::sync::{Arc, Mutex};

use bevy::prelude::*;
use serde::Deserialize;

use crate::engine::catalog::image_catalog::SortMetric;
use crate::engine::core::app_state::SwarmCommand;

/// Thread-safe queue bridging the page's `postMessage` events into the main
/// schedule.
#[derive(Resource)]
pub struct PageCommandQueue(pub Arc<Mutex<Vec<String>>>);

/// JSON shape posted by the page's UI buttons, mirroring the keyboard 1:1.
#[derive(Debug, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum PageCommand {
    SelectCategory { index: usize },
    CycleCategory,
    Randomize,
    SortBy { metric: String },
    ToggleMovement,
    Capture,
}

impl PageCommand {
    pub fn into_swarm_command(self) -> Option<SwarmCommand> {
        match self {
            PageCommand::SelectCategory { index } => Some(SwarmCommand::SelectCategory(index)),
            PageCommand::CycleCategory => Some(SwarmCommand::CycleCategory),
            PageCommand::Randomize => Some(SwarmCommand::Randomize),
            PageCommand::SortBy { metric } => {
                SortMetric::from_wire(&metric).map(SwarmCommand::SortBy)
            }
            PageCommand::ToggleMovement => Some(SwarmCommand::ToggleMovement),
            PageCommand::Capture => Some(SwarmCommand::CaptureTrigger),
        }
    }
}

/// Register the `message` listener and hand the queue to the ECS. Ownership
/// of the closure is transferred to JS for the page's lifetime.
#[cfg(target_arch = "wasm32")]
pub fn setup_page_command_listener(mut commands: Commands) {
    use wasm_bindgen::JsCast;
    use wasm_bindgen::prelude::Closure;

    let queue: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let queue_clone = queue.clone();

    let closure = Closure::wrap(Box::new(move |event: web_sys::MessageEvent| {
        if let Ok(data) = event.data().dyn_into::<js_sys::JsString>() {
            let message: String = data.into();
            // Pre-filter; JSON parsing happens on the main schedule.
            if message.contains("command") {
                if let Ok(mut pending) = queue_clone.lock() {
                    pending.push(message);
                }
            }
        }
    }) as Box<dyn FnMut(web_sys::MessageEvent)>);

    if let Some(window) = web_sys::window() {
        if let Err(err) = window
            .add_event_listener_with_callback("message", closure.as_ref().unchecked_ref())
        {
            error!("Failed to register page command listener: {err:?}");
        }
    }

    closure.forget();
    commands.insert_resource(PageCommandQueue(queue));
}

/// Drain queued page messages into swarm commands. Absent queue (native
/// builds) and malformed messages are both tolerated.
pub fn drain_page_commands(
    queue: Option<Res<PageCommandQueue>>,
    mut commands: EventWriter<SwarmCommand>,
) {
    let Some(queue) = queue else {
        return;
    };
    let messages = match queue.0.lock() {
        Ok(mut pending) => std::mem::take(&mut *pending),
        Err(_) => return,
    };

    for message in messages {
        match serde_json::from_str::<PageCommand>(&message) {
            Ok(command) => {
                if let Some(command) = command.into_swarm_command() {
                    commands.write(command);
                } else {
                    warn!("Page command with unknown metric: {message}");
                }
            }
            Err(err) => {
                warn!("Ignoring malformed page command ({err}): {message}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(message: &str) -> Option<SwarmCommand> {
        serde_json::from_str::<PageCommand>(message)
            .ok()
            .and_then(PageCommand::into_swarm_command)
    }

    #[test]
    fn button_messages_map_to_commands() {
        assert_eq!(
            parse(r#"{"command":"select_category","index":2}"#),
            Some(SwarmCommand::SelectCategory(2))
        );
        assert_eq!(
            parse(r#"{"command":"cycle_category"}"#),
            Some(SwarmCommand::CycleCategory)
        );
        assert_eq!(
            parse(r#"{"command":"randomize"}"#),
            Some(SwarmCommand::Randomize)
        );
        assert_eq!(
            parse(r#"{"command":"toggle_movement"}"#),
            Some(SwarmCommand::ToggleMovement)
        );
        assert_eq!(
            parse(r#"{"command":"capture"}"#),
            Some(SwarmCommand::CaptureTrigger)
        );
    }

    #[test]
    fn sort_metric_names_follow_the_wire_format() {
        assert_eq!(
            parse(r#"{"command":"sort_by","metric":"luminance"}"#),
            Some(SwarmCommand::SortBy(SortMetric::Luminance))
        );
        assert_eq!(parse(r#"{"command":"sort_by","metric":"hue"}"#), None);
    }

    #[test]
    fn malformed_messages_are_rejected() {
        assert_eq!(parse("not json"), None);
        assert_eq!(parse(r#"{"command":"warp_speed"}"#), None);
    }
}
