use std::{str::FromStr, time::Instant};

use glam::{Mat4, Vec2, Vec3};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    TogglePause,
    Stop,
    MouseDown(Vec2),
    MouseMove(Vec2),
    MouseUp,
}

/// Input replayed at fixed frame indices, for runs without a window.
#[derive(Debug, Clone, Default)]
pub struct ScriptedInput {
    /// `(frame, event)` pairs, sorted by frame.
    events: Vec<(u64, InputEvent)>,
    next: usize,
}

impl ScriptedInput {
    pub fn new(mut events: Vec<(u64, InputEvent)>) -> Self {
        events.sort_by_key(|&(frame, _)| frame);
        Self { events, next: 0 }
    }

    /// A pause toggle at every listed frame.
    pub fn toggles(frames: &[u64]) -> Self {
        Self::new(frames.iter().map(|&frame| (frame, InputEvent::TogglePause)).collect())
    }

    pub fn push(&mut self, frame: u64, event: InputEvent) {
        let at = self.events.partition_point(|&(f, _)| f <= frame);
        self.events.insert(at, (frame, event));
    }

    /// Presses the mouse at `drag.frame`, moves it by `drag.delta` and releases it a frame later.
    pub fn drag(&mut self, drag: Drag) {
        self.push(drag.frame, InputEvent::MouseDown(Vec2::ZERO));
        self.push(drag.frame, InputEvent::MouseMove(drag.delta));
        self.push(drag.frame + 1, InputEvent::MouseUp);
    }

    /// Events scheduled at or before `frame` that have not been delivered yet.
    pub fn poll(&mut self, frame: u64) -> impl Iterator<Item = InputEvent> + '_ {
        let start = self.next;
        while self.next < self.events.len() && self.events[self.next].0 <= frame {
            self.next += 1;
        }

        self.events[start..self.next].iter().map(|&(_, event)| event)
    }
}

/// A scripted mouse drag, written `FRAME:DX,DY` on the command line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Drag {
    pub frame: u64,
    /// Cursor travel in pixels.
    pub delta: Vec2,
}

impl FromStr for Drag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || format!("expected FRAME:DX,DY, got `{s}`");

        let (frame, delta) = s.split_once(':').ok_or_else(invalid)?;
        let (dx, dy) = delta.split_once(',').ok_or_else(invalid)?;

        Ok(Self {
            frame: frame.trim().parse().map_err(|_| invalid())?,
            delta: Vec2::new(
                dx.trim().parse().map_err(|_| invalid())?,
                dy.trim().parse().map_err(|_| invalid())?,
            ),
        })
    }
}

/// Drag-to-orbit camera around the simulation volume.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitCamera {
    pub theta_x: f32,
    pub theta_y: f32,
    /// Cursor position and angles when the current drag started.
    anchor: Option<(Vec2, f32, f32)>,
}

impl OrbitCamera {
    pub const SPEED: f32 = 0.005;
    pub const DEFAULT_THETA_X: f32 = 0.0;
    pub const DEFAULT_THETA_Y: f32 = 0.75;
    pub const EYE: Vec3 = Vec3::new(0.0, 0.0, 2.0);

    /// Applies a mouse event, returning whether the view changed.
    pub fn handle(&mut self, event: InputEvent) -> bool {
        match event {
            InputEvent::MouseDown(p) => {
                self.anchor = Some((p, self.theta_x, self.theta_y));
                false
            },
            InputEvent::MouseMove(p) => match self.anchor {
                Some((start, x0, y0)) => {
                    let delta = Self::SPEED * (p - start);
                    self.theta_x = x0 + delta.x;
                    self.theta_y = y0 + delta.y;
                    true
                },
                None => false,
            },
            InputEvent::MouseUp => {
                self.anchor = None;
                false
            },
            _ => false,
        }
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(Self::EYE, Vec3::ZERO, Vec3::X)
    }

    pub fn modelview(&self) -> Mat4 {
        self.view() * Mat4::from_rotation_x(self.theta_x) * Mat4::from_rotation_y(self.theta_y)
    }
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self {
            theta_x: Self::DEFAULT_THETA_X,
            theta_y: Self::DEFAULT_THETA_Y,
            anchor: None,
        }
    }
}

/// Frame-rate bookkeeping: a mean over every 100 frames and a smoothed running estimate.
#[derive(Debug, Clone, Default)]
pub struct FrameStats {
    frames: u64,
    window_frames: u32,
    window_time: f32,
    smoothed: f32,
}

impl FrameStats {
    pub const WINDOW: u32 = 100;
    const SMOOTHING: f32 = 0.05;
    const WARMUP: u64 = 4;

    /// Records one frame that took `elapsed` seconds. Returns the mean FPS whenever a window closes.
    pub fn record(&mut self, elapsed: f32) -> Option<f32> {
        self.frames += 1;

        if elapsed > 0.0 {
            let fps = 1.0 / elapsed;
            self.smoothed = if self.frames <= Self::WARMUP {
                self.smoothed + (fps - self.smoothed) / self.frames as f32
            } else {
                self.smoothed + Self::SMOOTHING * (fps - self.smoothed)
            };
        }

        self.window_frames += 1;
        self.window_time += elapsed.max(0.0);

        if self.window_frames < Self::WINDOW {
            return None;
        }

        let mean = if self.window_time > 0.0 { self.window_frames as f32 / self.window_time } else { 0.0 };
        log::info!("{mean:.1} fps over the last {} frames", self.window_frames);

        self.window_frames = 0;
        self.window_time = 0.0;
        Some(mean)
    }

    #[inline]
    pub fn smoothed_fps(&self) -> f32 {
        self.smoothed
    }
}

/// Source of per-frame elapsed time.
#[derive(Debug, Clone, Copy)]
pub enum FrameClock {
    /// Wall time between successive ticks.
    Realtime { last: Instant },
    /// A constant frame duration, for reproducible offline runs.
    Fixed { dt: f32 },
}

impl FrameClock {
    pub fn realtime() -> Self {
        FrameClock::Realtime { last: Instant::now() }
    }

    pub fn fixed(fps: u32) -> Self {
        FrameClock::Fixed { dt: 1.0 / fps.max(1) as f32 }
    }

    /// Seconds since the previous tick.
    pub fn tick(&mut self) -> f32 {
        match self {
            FrameClock::Realtime { last } => {
                let now = Instant::now();
                let elapsed = now.duration_since(*last).as_secs_f32();
                *last = now;
                elapsed
            },
            FrameClock::Fixed { dt } => *dt,
        }
    }
}
