/// Terminal host for the CubeDeck carousel
use crossterm::{
    cursor,
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        MouseButton, MouseEvent, MouseEventKind,
    },
    execute, queue,
    style::Color,
    terminal::{self},
};
use cubedeck_core::host::UrlPrompt;
use cubedeck_core::{
    Camera, Direction, FaceBindingStore, LayoutParams, Mesh, PersistenceGateway, Phase, Timings,
    TransitionController,
};
use std::io::{self, stdout, Write};
use std::time::{Duration, Instant};
use tracing::{debug, info};

pub mod error;
pub mod host;
pub mod net;
pub mod prompt;
pub mod renderer;
pub mod scene;
pub mod tween;
pub mod view;

pub use error::{Result, TerminalError};
pub use host::{HostEvent, PageSource, TerminalHost};
pub use renderer::AsciiRenderer;

const HELP: &str = "←/→ rotate  ↑/↓ cube  Enter open  + add  b bind  c change  x remove  q quit";

#[derive(Debug, Clone, Copy)]
pub struct AppConfig {
    /// How long a page is shown before it counts as loaded
    pub view_dwell: Duration,
    pub fps: u32,
    pub layout: LayoutParams,
    pub timings: Timings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            view_dwell: Duration::from_millis(1500),
            fps: 30,
            layout: LayoutParams::default(),
            timings: Timings::default(),
        }
    }
}

/// Main application struct for the terminal carousel
pub struct TerminalApp<G> {
    controller: TransitionController<G>,
    host: TerminalHost,
    mesh: Mesh,
    renderer: AsciiRenderer,
    target_fps: u32,
    running: bool,
    last_frame: Instant,
    frame_count: u32,
    fps: f32,
}

impl<G: PersistenceGateway> TerminalApp<G> {
    pub fn new(store: FaceBindingStore<G>, pages: Box<dyn PageSource>, config: AppConfig) -> io::Result<Self> {
        let (width, height) = terminal::size()?;
        Ok(Self::with_size(
            store,
            pages,
            Box::new(prompt::TerminalPrompt),
            config,
            width,
            height,
        ))
    }

    pub fn with_size(
        store: FaceBindingStore<G>,
        pages: Box<dyn PageSource>,
        prompt: Box<dyn UrlPrompt>,
        config: AppConfig,
        width: u16,
        height: u16,
    ) -> Self {
        let (width, height) = (u32::from(width), u32::from(height));
        let mut controller = TransitionController::new(
            store,
            config.layout,
            config.timings,
            Camera::new(width, height),
        );
        let mut host = TerminalHost::new(pages, prompt, config.view_dwell, (width, height));
        controller.attach(&mut host);

        Self {
            controller,
            host,
            mesh: Mesh::cube(1.0),
            renderer: AsciiRenderer::new(width as usize, height as usize),
            target_fps: config.fps.max(1),
            running: true,
            last_frame: Instant::now(),
            frame_count: 0,
            fps: 0.0,
        }
    }

    pub fn controller(&self) -> &TransitionController<G> {
        &self.controller
    }

    pub fn host(&self) -> &TerminalHost {
        &self.host
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn run(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            stdout(),
            terminal::EnterAlternateScreen,
            EnableMouseCapture,
            cursor::Hide
        )?;

        let result = self.main_loop();

        // Cleanup
        terminal::disable_raw_mode()?;
        execute!(
            stdout(),
            DisableMouseCapture,
            terminal::LeaveAlternateScreen,
            cursor::Show
        )?;

        result
    }

    fn main_loop(&mut self) -> io::Result<()> {
        let target_frame_time = Duration::from_millis(1000 / u64::from(self.target_fps));
        info!(fps = self.target_fps, "carousel started");

        while self.running {
            let frame_start = Instant::now();

            // Handle input
            while event::poll(Duration::from_millis(0))? {
                let event = event::read()?;
                self.handle_event(event);
            }

            // Update
            self.tick(Instant::now());

            // Render
            self.render()?;

            // Frame timing
            self.frame_count += 1;
            let elapsed = frame_start.elapsed();
            if elapsed < target_frame_time {
                std::thread::sleep(target_frame_time - elapsed);
            }

            // Update FPS counter
            let now = Instant::now();
            if (now - self.last_frame).as_secs() >= 1 {
                self.fps = self.frame_count as f32 / (now - self.last_frame).as_secs_f32();
                self.frame_count = 0;
                self.last_frame = now;
            }
        }

        info!("carousel stopped");
        Ok(())
    }

    /// Advance animations and feed every host completion to the controller
    pub fn tick(&mut self, now: Instant) {
        self.host.poll(now);
        while let Some(event) = self.host.next_event() {
            let host = &mut self.host;
            match event {
                HostEvent::TweenFinished(ticket) => self.controller.on_tween_finished(ticket, host),
                HostEvent::Fetched(result) => self.controller.on_content_fetched(result, host),
                HostEvent::ContentReady => self.controller.on_content_ready(host),
                HostEvent::CloseRequested => self.controller.on_close_requested(host),
                HostEvent::Snapshot(result) => self.controller.on_snapshot(result, host),
            }
        }
    }

    pub fn handle_event(&mut self, event: Event) {
        match event {
            Event::Key(KeyEvent { code, kind, .. }) if kind != KeyEventKind::Release => {
                self.host.clear_notice();
                self.handle_key(code);
            }
            Event::Mouse(MouseEvent {
                kind: MouseEventKind::Down(MouseButton::Left),
                column,
                row,
                ..
            }) => {
                let caster = self.host.scene().ray_caster();
                let (x, y) = (f32::from(column) + 0.5, f32::from(row) + 0.5);
                self.controller.click(x, y, &caster, &mut self.host);
            }
            Event::Resize(width, height) => {
                debug!(width, height, "terminal resized");
                self.controller.resize(u32::from(width), u32::from(height));
                self.host.resize(u32::from(width), u32::from(height));
                self.renderer.resize(usize::from(width), usize::from(height));
            }
            _ => {}
        }
    }

    fn handle_key(&mut self, code: KeyCode) {
        let host = &mut self.host;
        let controller = &mut self.controller;
        match code {
            KeyCode::Char('q') => self.running = false,
            KeyCode::Esc if controller.view().phase == Phase::Viewing => host.request_close(),
            KeyCode::Left => {
                controller.rotate(Direction::Backward, host);
            }
            KeyCode::Right => {
                controller.rotate(Direction::Forward, host);
            }
            KeyCode::Up | KeyCode::Char('p') => {
                controller.switch_cube(Direction::Forward, host);
            }
            KeyCode::Down | KeyCode::Char('n') => {
                controller.switch_cube(Direction::Backward, host);
            }
            KeyCode::Enter => {
                controller.enlarge(host);
            }
            KeyCode::Char('+') => {
                controller.add_cube(host);
            }
            KeyCode::Char('b') => {
                controller.bind_page(host);
            }
            KeyCode::Char('c') => {
                controller.change_page(host);
            }
            KeyCode::Char('x') => {
                controller.remove_page(host);
            }
            _ => {}
        }
    }

    fn render(&mut self) -> io::Result<()> {
        // Clear renderer
        self.renderer.clear();

        match self.host.view() {
            Some(view) => {
                for (row, line) in view.lines().iter().enumerate() {
                    self.renderer.draw_text(1, row as i32 + 2, line, Color::White);
                }
            }
            None => self.render_carousel(),
        }
        self.render_overlay();

        // Output to terminal
        let mut stdout = stdout();
        queue!(stdout, cursor::MoveTo(0, 0))?;
        self.renderer.draw(&mut stdout)?;
        stdout.flush()?;
        Ok(())
    }

    fn render_carousel(&mut self) {
        let scene = self.host.scene();
        let mut camera: Camera = self.controller.camera().clone();
        camera.position = scene.camera;
        for (cube, pose) in &scene.poses {
            self.renderer
                .render_cube(&self.mesh, &pose.model_matrix(), &camera, &scene.shades(*cube));
        }

        if let Some(label) = self.controller.active_label() {
            let half = label.text.chars().count() as f32 / 2.0;
            let row = label.y.max(1.0) as i32;
            self.renderer
                .draw_text((label.x - half) as i32, row, &label.text, Color::Yellow);
        }
    }

    fn render_overlay(&mut self) {
        let view = self.controller.view();
        let (_, height) = self.renderer.size();
        let status = match view.phase {
            Phase::Viewing | Phase::Capturing => format!(
                "CubeDeck | {} | Esc=Close q=Quit",
                self.controller.active_binding().url.as_deref().unwrap_or_default()
            ),
            _ => format!(
                "CubeDeck | Cube {} Face {} | {:?} | FPS: {:.1} | {HELP}",
                view.active_cube, view.active_face, view.phase, self.fps
            ),
        };
        self.renderer.draw_text(0, 0, &status, Color::Yellow);
        if let Some(notice) = self.host.notice() {
            self.renderer
                .draw_text(0, height as i32 - 1, notice, Color::Red);
        }
    }
}
