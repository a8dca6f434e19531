use std::sync::{Arc, Mutex};

use bevy::prelude::*;

use crate::constants::swarm_settings::SwarmConfig;
use crate::engine::core::app_state::{CollageState, SwarmCommand};
use crate::engine::swarm::motion::MovementMode;
use crate::error::SwarmError;

#[cfg(target_arch = "wasm32")]
use crate::constants::path;

/// Two trigger presses inside this window fire one capture.
pub const DEBOUNCE_WINDOW_SECS: f32 = 3.0;
/// Delay between canvas lookup attempts before first paint.
pub const RETRY_DELAY_SECS: f32 = 0.3;
/// Retries scheduled after the initial canvas lookup misses. Six lookups
/// in total before giving up with a user-visible alert.
pub const MAX_SURFACE_RETRIES: u32 = 5;
#[cfg(target_arch = "wasm32")]
const JPEG_QUALITY: f64 = 0.7;

/// Successful QR generation payload from the capture endpoint.
#[derive(Debug, Clone)]
pub struct QrTicket {
    pub qr_code: String,
    pub original_image: String,
}

pub type UploadQueue = Arc<Mutex<Vec<Result<QrTicket, SwarmError>>>>;

#[derive(Resource, Default, Clone)]
pub struct UploadResultQueue(pub UploadQueue);

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CapturePhase {
    Idle,
    Capturing { attempt: u32, next_attempt_at: f32 },
    Uploading,
    Displaying { dismiss_at: f32 },
}

/// Snapshot-to-QR state machine. All transitions happen on the main
/// schedule; the upload continuation reports back through the result queue
/// and is ignored unless the flow is still in `Uploading`.
#[derive(Resource)]
pub struct CaptureFlow {
    pub phase: CapturePhase,
    press_count: u32,
    window_deadline: Option<f32>,
}

impl Default for CaptureFlow {
    fn default() -> Self {
        Self {
            phase: CapturePhase::Idle,
            press_count: 0,
            window_deadline: None,
        }
    }
}

impl CaptureFlow {
    /// Debounced double-activation. Returns true when the press completes a
    /// pair inside the window; the counter resets on firing, so three rapid
    /// presses fire once, and presses spaced wider than the window never
    /// fire.
    pub fn register_press(&mut self, now: f32) -> bool {
        if let Some(deadline) = self.window_deadline {
            if now >= deadline {
                self.press_count = 0;
            }
        }
        self.press_count += 1;
        self.window_deadline = Some(now + DEBOUNCE_WINDOW_SECS);

        if self.press_count >= 2 {
            self.press_count = 0;
            self.window_deadline = None;
            true
        } else {
            false
        }
    }

    /// Expire the debounce window; called every frame.
    pub fn expire_window(&mut self, now: f32) {
        if let Some(deadline) = self.window_deadline {
            if now >= deadline {
                self.press_count = 0;
                self.window_deadline = None;
            }
        }
    }

    pub fn begin_capture(&mut self, now: f32) {
        self.phase = CapturePhase::Capturing {
            attempt: 0,
            next_attempt_at: now,
        };
    }

    /// Record a missing render surface. Schedules another attempt, or
    /// returns the terminal error once the retry bound is exhausted. The
    /// bound counts retries, so the sixth consecutive miss is terminal.
    pub fn record_missing_surface(&mut self, now: f32) -> Option<SwarmError> {
        let CapturePhase::Capturing { attempt, .. } = self.phase else {
            return None;
        };
        let attempt = attempt + 1;
        if attempt > MAX_SURFACE_RETRIES {
            self.phase = CapturePhase::Idle;
            Some(SwarmError::CaptureSurfaceNotReady(attempt))
        } else {
            self.phase = CapturePhase::Capturing {
                attempt,
                next_attempt_at: now + RETRY_DELAY_SECS,
            };
            None
        }
    }
}

pub fn capture_debounce_window(time: Res<Time>, mut flow: ResMut<CaptureFlow>) {
    flow.expire_window(time.elapsed_secs());
}

/// Attempt the canvas readback while in `Capturing`. The retry loop guards
/// against the trigger firing before first paint.
pub fn advance_capture(
    time: Res<Time>,
    upload_queue: Res<UploadResultQueue>,
    mut flow: ResMut<CaptureFlow>,
) {
    let CapturePhase::Capturing {
        next_attempt_at, ..
    } = flow.phase
    else {
        return;
    };
    let now = time.elapsed_secs();
    if now < next_attempt_at {
        return;
    }

    #[cfg(target_arch = "wasm32")]
    {
        match read_canvas_data_url() {
            Some(data_url) => {
                info!("Canvas captured, uploading snapshot");
                flow.phase = CapturePhase::Uploading;
                issue_upload(upload_queue.0.clone(), data_url);
            }
            None => {
                if let Some(err) = flow.record_missing_surface(now) {
                    error!("{err}");
                    alert(&err.to_string());
                }
            }
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        let _ = &upload_queue;
        warn!("Canvas capture is only available in browser builds");
        flow.phase = CapturePhase::Idle;
    }
}

/// Consume completed uploads. Results arriving after the flow moved on
/// (stale continuations) are dropped without touching state.
pub fn drain_upload_results(
    time: Res<Time>,
    config: Res<SwarmConfig>,
    queue: Res<UploadResultQueue>,
    mut flow: ResMut<CaptureFlow>,
) {
    let results = match queue.0.lock() {
        Ok(mut pending) => std::mem::take(&mut *pending),
        Err(_) => return,
    };

    for result in results {
        if flow.phase != CapturePhase::Uploading {
            continue;
        }
        match result {
            Ok(ticket) => {
                info!("QR code ready: {}", ticket.qr_code);
                show_qr_overlay(&ticket);
                flow.phase = CapturePhase::Displaying {
                    dismiss_at: time.elapsed_secs() + config.qr_display_secs,
                };
            }
            Err(err) => {
                error!("{err}");
                alert(&err.to_string());
                flow.phase = CapturePhase::Idle;
            }
        }
    }
}

/// Hide the overlay once its display window lapses. A dismiss firing after
/// the overlay is already gone is a no-op by construction: the phase check
/// is the timer. The optional reset policy also stops movement and
/// reselects, which some deployments wanted after sharing.
pub fn auto_dismiss_overlay(
    time: Res<Time>,
    config: Res<SwarmConfig>,
    mut flow: ResMut<CaptureFlow>,
    mut collage: ResMut<CollageState>,
    mut commands: EventWriter<SwarmCommand>,
) {
    let CapturePhase::Displaying { dismiss_at } = flow.phase else {
        return;
    };
    if time.elapsed_secs() < dismiss_at {
        return;
    }

    info!("QR overlay display window lapsed, hiding");
    hide_qr_overlay();
    flow.phase = CapturePhase::Idle;

    if config.reset_on_dismiss {
        collage.movement_mode = MovementMode::Off;
        commands.write(SwarmCommand::Reset);
    }
}

#[cfg(target_arch = "wasm32")]
fn read_canvas_data_url() -> Option<String> {
    use wasm_bindgen::JsCast;

    let document = web_sys::window()?.document()?;
    let canvas = document.query_selector("canvas").ok()??;
    let canvas: web_sys::HtmlCanvasElement = canvas.dyn_into().ok()?;
    canvas
        .to_data_url_with_type_and_encoder_options(
            "image/jpeg",
            &wasm_bindgen::JsValue::from_f64(JPEG_QUALITY),
        )
        .ok()
}

#[cfg(target_arch = "wasm32")]
fn issue_upload(queue: UploadQueue, data_url: String) {
    wasm_bindgen_futures::spawn_local(async move {
        let result = post_snapshot(&data_url).await;
        if let Ok(mut pending) = queue.lock() {
            pending.push(result);
        }
    });
}

#[cfg(target_arch = "wasm32")]
async fn post_snapshot(data_url: &str) -> Result<QrTicket, SwarmError> {
    use wasm_bindgen::{JsCast, JsValue};
    use wasm_bindgen_futures::JsFuture;

    #[derive(serde::Deserialize)]
    struct QrResponse {
        success: bool,
        #[serde(default)]
        qr_code: Option<String>,
        #[serde(default)]
        original_image: Option<String>,
        #[serde(default)]
        error: Option<String>,
    }

    let failed = |detail: String| SwarmError::UploadFailed(detail);

    let body = format!(
        "image_data={}",
        js_sys::encode_uri_component(data_url)
    );
    let init = web_sys::RequestInit::new();
    init.set_method("POST");
    init.set_body(&JsValue::from_str(&body));

    let request = web_sys::Request::new_with_str_and_init(path::QR_ENDPOINT, &init)
        .map_err(|err| failed(format!("{err:?}")))?;
    request
        .headers()
        .set("Content-Type", "application/x-www-form-urlencoded")
        .map_err(|err| failed(format!("{err:?}")))?;

    let window = web_sys::window().ok_or_else(|| failed("no window object".into()))?;
    let response = JsFuture::from(window.fetch_with_request(&request))
        .await
        .map_err(|err| failed(format!("{err:?}")))?;
    let response: web_sys::Response = response
        .dyn_into()
        .map_err(|_| failed("unexpected fetch result".into()))?;
    if !response.ok() {
        return Err(failed(format!("server responded with {}", response.status())));
    }

    let body = JsFuture::from(response.text().map_err(|err| failed(format!("{err:?}")))?)
        .await
        .map_err(|err| failed(format!("{err:?}")))?;
    let body = body
        .as_string()
        .ok_or_else(|| failed("non-string response body".into()))?;
    let payload: QrResponse =
        serde_json::from_str(&body).map_err(|err| failed(err.to_string()))?;

    if payload.success {
        Ok(QrTicket {
            qr_code: payload.qr_code.unwrap_or_default(),
            original_image: payload.original_image.unwrap_or_default(),
        })
    } else {
        Err(failed(
            payload.error.unwrap_or_else(|| "unspecified server error".into()),
        ))
    }
}

#[cfg(target_arch = "wasm32")]
fn show_qr_overlay(ticket: &QrTicket) {
    let Some(document) = web_sys::window().and_then(|window| window.document()) else {
        return;
    };
    let Some(content) = document.get_element_by_id(path::QR_CONTENT_ID) else {
        warn!("QR content element #{} not found", path::QR_CONTENT_ID);
        return;
    };
    content.set_inner_html(&format!(
        "<img src=\"{}\" style=\"max-width: 200px; margin-bottom: 10px;\" />\
         <br><a href=\"{}\" target=\"_blank\">{}</a>",
        ticket.qr_code, ticket.original_image, ticket.original_image
    ));
    set_overlay_display("block");
}

#[cfg(not(target_arch = "wasm32"))]
fn show_qr_overlay(ticket: &QrTicket) {
    info!("QR overlay (native stub): {}", ticket.qr_code);
}

#[cfg(target_arch = "wasm32")]
fn hide_qr_overlay() {
    if let Some(document) = web_sys::window().and_then(|window| window.document()) {
        if let Some(content) = document.get_element_by_id(path::QR_CONTENT_ID) {
            content.set_inner_html("");
        }
    }
    set_overlay_display("none");
}

#[cfg(not(target_arch = "wasm32"))]
fn hide_qr_overlay() {}

#[cfg(target_arch = "wasm32")]
fn set_overlay_display(value: &str) {
    use wasm_bindgen::JsCast;

    let Some(document) = web_sys::window().and_then(|window| window.document()) else {
        return;
    };
    let Some(container) = document.get_element_by_id(path::QR_CONTAINER_ID) else {
        warn!("QR container element #{} not found", path::QR_CONTAINER_ID);
        return;
    };
    if let Ok(container) = container.dyn_into::<web_sys::HtmlElement>() {
        if let Err(err) = container.style().set_property("display", value) {
            warn!("Failed to toggle QR overlay: {err:?}");
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn alert(message: &str) {
    if let Some(window) = web_sys::window() {
        let _ = window.alert_with_message(message);
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn alert(message: &str) {
    warn!("alert: {message}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_presses_within_window_fire_once() {
        let mut flow = CaptureFlow::default();
        assert!(!flow.register_press(0.0));
        assert!(flow.register_press(1.0));
        // Counter reset on firing: a third rapid press starts a new pair.
        assert!(!flow.register_press(1.1));
    }

    #[test]
    fn presses_outside_window_never_fire() {
        let mut flow = CaptureFlow::default();
        assert!(!flow.register_press(0.0));
        // 4 seconds later the window has lapsed; this press stands alone.
        assert!(!flow.register_press(4.0));
        assert!(!flow.register_press(8.5));
    }

    #[test]
    fn frame_driven_expiry_resets_the_counter() {
        let mut flow = CaptureFlow::default();
        assert!(!flow.register_press(0.0));
        flow.expire_window(3.5);
        assert!(!flow.register_press(3.6));
        assert!(flow.register_press(3.7));
    }

    #[test]
    fn five_retries_are_scheduled_before_the_sixth_lookup_is_terminal() {
        let mut flow = CaptureFlow::default();
        flow.begin_capture(0.0);

        // First lookup miss plus five scheduled retries: six lookups total.
        for attempt in 1..=MAX_SURFACE_RETRIES {
            assert_eq!(flow.record_missing_surface(attempt as f32 * 0.3), None);
            let CapturePhase::Capturing {
                attempt: recorded,
                next_attempt_at,
            } = flow.phase
            else {
                panic!("flow left Capturing early");
            };
            assert_eq!(recorded, attempt);
            assert!(next_attempt_at > attempt as f32 * 0.3);
        }

        let terminal = flow.record_missing_surface(1.8);
        assert_eq!(
            terminal,
            Some(SwarmError::CaptureSurfaceNotReady(MAX_SURFACE_RETRIES + 1))
        );
        assert_eq!(flow.phase, CapturePhase::Idle);
    }

    #[test]
    fn missing_surface_outside_capturing_is_a_no_op() {
        let mut flow = CaptureFlow::default();
        flow.phase = CapturePhase::Uploading;
        assert_eq!(flow.record_missing_surface(0.0), None);
        assert_eq!(flow.phase, CapturePhase::Uploading);
    }
}
