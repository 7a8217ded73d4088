//! Application event loop.
//!
//! [`run`] opens a window, builds the GPU [`Context`], mounts a
//! [`SceneSession`] sized to the window and drives it with winit events:
//!
//! 1. `Resized` resizes the surface and the session viewport
//! 2. `RedrawRequested` ticks the session, draws the frame and requests the
//!    next redraw while the session is still mounted
//! 3. clicks, number keys, Enter/Space and Escape become session commands
//! 4. session events are handed to the [`SessionListener`]
//!
//! When the mission completes or is cancelled the session is torn down
//! before the window goes away and the loop exits.

use std::sync::Arc;

use instant::Instant;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalPosition,
    event::{ElementState, KeyEvent, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::Window,
};

use crate::{
    config::EngineConfig,
    context::Context,
    mission::{AnswerOutcome, Question},
    render::Renderer,
    resources::gpu::WgpuBackend,
    session::{SceneRequest, SceneSession, SessionError, SessionEvent},
};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

/// Receives what happens inside a running session.
///
/// All hooks default to doing nothing.
pub trait SessionListener {
    fn on_interact(&mut self, _name: &str) {}
    fn on_challenge(&mut self, _target: usize, _question: &Question) {}
    fn on_answer(&mut self, _outcome: &AnswerOutcome) {}
    fn on_target_changed(&mut self, _target: usize) {}
    fn on_complete(&mut self, _score: u32) {}
    fn on_cancel(&mut self) {}
}

/// Hand an event to the listener. Returns `true` for events that end the
/// session.
pub fn dispatch(listener: &mut dyn SessionListener, event: &SessionEvent) -> bool {
    match event {
        SessionEvent::Interacted(name) => listener.on_interact(name),
        SessionEvent::ChallengeStarted { target, question } => {
            listener.on_challenge(*target, question)
        }
        SessionEvent::Answered(outcome) => listener.on_answer(outcome),
        SessionEvent::TargetChanged(target) => listener.on_target_changed(*target),
        SessionEvent::Completed { score } => {
            listener.on_complete(*score);
            return true;
        }
        SessionEvent::Cancelled => {
            listener.on_cancel();
            return true;
        }
    }
    false
}

/// Session command bound to a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Answer(usize),
    Advance,
    Cancel,
}

impl Command {
    pub fn from_key(key: KeyCode) -> Option<Self> {
        let answer = match key {
            KeyCode::Digit1 | KeyCode::Numpad1 => 0,
            KeyCode::Digit2 | KeyCode::Numpad2 => 1,
            KeyCode::Digit3 | KeyCode::Numpad3 => 2,
            KeyCode::Digit4 | KeyCode::Numpad4 => 3,
            KeyCode::Digit5 | KeyCode::Numpad5 => 4,
            KeyCode::Digit6 | KeyCode::Numpad6 => 5,
            KeyCode::Digit7 | KeyCode::Numpad7 => 6,
            KeyCode::Digit8 | KeyCode::Numpad8 => 7,
            KeyCode::Digit9 | KeyCode::Numpad9 => 8,
            KeyCode::Enter | KeyCode::NumpadEnter | KeyCode::Space => return Some(Self::Advance),
            KeyCode::Escape => return Some(Self::Cancel),
            _ => return None,
        };
        Some(Self::Answer(answer))
    }
}

/// Everything that exists once the window and the GPU are up.
///
/// Field order matters: the session releases its resources before the
/// renderer and the context (and with it the window) are dropped.
struct HostState {
    session: SceneSession<WgpuBackend>,
    renderer: Renderer,
    ctx: Context,
}

impl HostState {
    fn new(ctx: Context, request: SceneRequest, config: EngineConfig) -> Result<Self, SessionError> {
        let backend = WgpuBackend::new(&ctx.device, &ctx.queue);
        let renderer = Renderer::new(&ctx, &backend);
        let size = ctx.window.inner_size();
        let session = SceneSession::open(
            backend,
            (size.width, size.height),
            request,
            config,
            rand::random(),
        )?;
        Ok(Self {
            session,
            renderer,
            ctx,
        })
    }
}

pub(crate) enum FlowEvent {
    #[allow(dead_code)]
    Initialized(Context),
    #[allow(dead_code)]
    Failed(String),
}

pub struct App {
    #[cfg(not(target_arch = "wasm32"))]
    async_runtime: tokio::runtime::Runtime,
    #[allow(dead_code)]
    proxy: winit::event_loop::EventLoopProxy<FlowEvent>,
    state: Option<HostState>,
    // Taken once the session is opened.
    request: Option<SceneRequest>,
    config: EngineConfig,
    listener: Box<dyn SessionListener>,
    cursor: PhysicalPosition<f64>,
    start_time: Instant,
}

impl App {
    fn new(
        event_loop: &EventLoop<FlowEvent>,
        request: SceneRequest,
        config: EngineConfig,
        listener: Box<dyn SessionListener>,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            #[cfg(not(target_arch = "wasm32"))]
            async_runtime: tokio::runtime::Runtime::new()?,
            proxy: event_loop.create_proxy(),
            state: None,
            request: Some(request),
            config,
            listener,
            cursor: PhysicalPosition::new(0.0, 0.0),
            start_time: Instant::now(),
        })
    }

    fn mount(&mut self, event_loop: &ActiveEventLoop, ctx: Context) {
        let Some(request) = self.request.take() else {
            log::warn!("Scene already mounted");
            return;
        };
        match HostState::new(ctx, request, self.config) {
            Ok(state) => {
                state.ctx.window.request_redraw();
                self.state = Some(state);
                self.start_time = Instant::now();
            }
            Err(e) => {
                log::error!("Could not open the scene: {}", e);
                event_loop.exit();
            }
        }
    }

    /// Forward session events and shut down after a terminal one.
    fn handle_events(&mut self, event_loop: &ActiveEventLoop, events: Vec<SessionEvent>) {
        let finished = events
            .iter()
            .fold(false, |done, event| dispatch(self.listener.as_mut(), event) || done);
        if finished {
            self.shutdown(event_loop);
        }
    }

    fn handle_command(&mut self, event_loop: &ActiveEventLoop, command: Command) {
        let Some(state) = &mut self.state else {
            return;
        };
        let result = match command {
            Command::Answer(option) => state.session.select_answer(option),
            Command::Advance => state.session.advance(),
            Command::Cancel => state.session.cancel(),
        };
        match result {
            Ok(event) => self.handle_events(event_loop, vec![event]),
            Err(e) => log::warn!("{:?} ignored: {}", command, e),
        }
    }

    /// Tear the session down while the window still exists, then exit.
    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(mut state) = self.state.take() {
            state.session.teardown();
        }
        event_loop.exit();
    }
}

impl ApplicationHandler<FlowEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() || self.request.is_none() {
            return;
        }

        #[allow(unused_mut)]
        let mut window_attributes = Window::default_attributes().with_title("orbit-ngin");

        #[cfg(target_arch = "wasm32")]
        {
            use wasm_bindgen::JsCast;
            use winit::platform::web::WindowAttributesExtWebSys;

            const CANVAS_ID: &str = "canvas";

            let window = wgpu::web_sys::window().unwrap_throw();
            let document = window.document().unwrap_throw();
            let canvas = document.get_element_by_id(CANVAS_ID).unwrap_throw();
            let html_canvas_element = canvas.unchecked_into();
            window_attributes = window_attributes.with_canvas(Some(html_canvas_element));
        }

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Could not create a window: {}", e);
                event_loop.exit();
                return;
            }
        };

        #[cfg(not(target_arch = "wasm32"))]
        {
            match self.async_runtime.block_on(Context::new(window)) {
                Ok(ctx) => self.mount(event_loop, ctx),
                Err(e) => {
                    log::error!("Could not set up the GPU: {}", e);
                    event_loop.exit();
                }
            }
        }

        #[cfg(target_arch = "wasm32")]
        {
            let proxy = self.proxy.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let event = match Context::new(window).await {
                    Ok(ctx) => FlowEvent::Initialized(ctx),
                    Err(e) => FlowEvent::Failed(e.to_string()),
                };
                if proxy.send_event(event).is_err() {
                    log::error!("Event loop closed before the GPU was ready");
                }
            });
        }
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: FlowEvent) {
        match event {
            // This is the message from our wasm `spawn_local`
            FlowEvent::Initialized(mut ctx) => {
                let size = ctx.window.inner_size();
                ctx.resize(size.width, size.height);
                self.mount(event_loop, ctx);
            }
            FlowEvent::Failed(reason) => {
                log::error!("Could not set up the GPU: {}", reason);
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let Some(state) = &mut self.state else {
            if let WindowEvent::CloseRequested = event {
                event_loop.exit();
            }
            return;
        };

        match event {
            WindowEvent::CloseRequested => self.handle_command(event_loop, Command::Cancel),
            WindowEvent::Resized(size) => {
                state.ctx.resize(size.width, size.height);
                state.session.resize(size.width, size.height);
            }
            WindowEvent::CursorMoved { position, .. } => self.cursor = position,
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button: MouseButton::Left,
                ..
            } => {
                let event = state
                    .session
                    .click(self.cursor.x as f32, self.cursor.y as f32);
                if let Some(event) = event {
                    self.handle_events(event_loop, vec![event]);
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } => {
                if let Some(command) = Command::from_key(code) {
                    self.handle_command(event_loop, command);
                }
            }
            WindowEvent::RedrawRequested => {
                let events = state.session.frame(self.start_time.elapsed());
                if state.session.is_mounted() {
                    if let Err(e) = state.renderer.render(
                        &state.ctx,
                        state.session.graph(),
                        state.session.rig(),
                        state.session.backend(),
                    ) {
                        log::error!("Unable to render {}", e);
                    }
                    state.ctx.window.request_redraw();
                }
                self.handle_events(event_loop, events);
            }
            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(mut state) = self.state.take() {
            state.session.teardown();
        }
    }
}

/// Run `request` in a window with the default engine constants.
pub fn run(request: SceneRequest, listener: Box<dyn SessionListener>) -> anyhow::Result<()> {
    run_with_config(request, EngineConfig::default(), listener)
}

pub fn run_with_config(
    request: SceneRequest,
    config: EngineConfig,
    listener: Box<dyn SessionListener>,
) -> anyhow::Result<()> {
    #[cfg(not(target_arch = "wasm32"))]
    {
        if let Err(e) = env_logger::try_init() {
            println!("Warning: Could not initialize logger: {}", e);
        };
    }

    #[cfg(target_arch = "wasm32")]
    {
        console_log::init_with_level(log::Level::Info).unwrap_throw();
    }

    let event_loop: EventLoop<FlowEvent> = EventLoop::with_user_event().build()?;
    let mut app = App::new(&event_loop, request, config, listener)?;

    event_loop.run_app(&mut app)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        calls: Vec<String>,
    }

    impl SessionListener for Recorder {
        fn on_interact(&mut self, name: &str) {
            self.calls.push(format!("interact {}", name));
        }

        fn on_complete(&mut self, score: u32) {
            self.calls.push(format!("complete {}", score));
        }

        fn on_cancel(&mut self) {
            self.calls.push("cancel".into());
        }
    }

    #[test]
    fn keys_map_to_commands() {
        assert_eq!(Command::from_key(KeyCode::Digit1), Some(Command::Answer(0)));
        assert_eq!(Command::from_key(KeyCode::Numpad9), Some(Command::Answer(8)));
        assert_eq!(Command::from_key(KeyCode::Space), Some(Command::Advance));
        assert_eq!(Command::from_key(KeyCode::Escape), Some(Command::Cancel));
        assert_eq!(Command::from_key(KeyCode::KeyQ), None);
    }

    #[test]
    fn only_terminal_events_end_the_session() {
        let mut recorder = Recorder::default();
        assert!(!dispatch(
            &mut recorder,
            &SessionEvent::Interacted("earth".into())
        ));
        assert!(!dispatch(&mut recorder, &SessionEvent::TargetChanged(1)));
        assert!(dispatch(
            &mut recorder,
            &SessionEvent::Completed { score: 1000 }
        ));
        assert!(dispatch(&mut recorder, &SessionEvent::Cancelled));
        assert_eq!(
            recorder.calls,
            vec!["interact earth", "complete 1000", "cancel"]
        );
    }
}
