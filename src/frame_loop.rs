use winit::event::{ElementState, VirtualKeyCode};

/// Key that asks the window to close.
pub const CLOSE_KEY: VirtualKeyCode = VirtualKeyCode::Escape;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LoopState {
    Running,
    /// Close was requested, the frame in progress is still drawn and presented.
    ClosingRequested,
    Terminated,
}

/// Tracks when the render loop has to stop.
///
/// A close request never cuts a frame short: it only takes effect in [`FrameLoop::finish_frame`].
#[derive(Debug)]
pub struct FrameLoop {
    state: LoopState,
    frames: u64,
}

impl FrameLoop {
    pub fn new() -> Self {
        Self {
            state: LoopState::Running,
            frames: 0,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn request_close(&mut self) {
        if self.state == LoopState::Running {
            self.state = LoopState::ClosingRequested;
        }
    }

    pub fn handle_key(&mut self, key: Option<VirtualKeyCode>, state: ElementState) {
        if key == Some(CLOSE_KEY) && state == ElementState::Pressed {
            self.request_close();
        }
    }

    pub fn should_render(&self) -> bool {
        self.state != LoopState::Terminated
    }

    /// Call after the frame was presented.
    pub fn finish_frame(&mut self) -> LoopState {
        if self.state == LoopState::Terminated {
            return self.state;
        }

        self.frames += 1;
        if self.state == LoopState::ClosingRequested {
            self.state = LoopState::Terminated;
        }

        self.state
    }
}

impl Default for FrameLoop {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runs_until_asked() {
        let mut frame_loop = FrameLoop::new();

        for _ in 0..10 {
            assert!(frame_loop.should_render());
            assert_eq!(frame_loop.finish_frame(), LoopState::Running);
        }
        assert_eq!(frame_loop.frames(), 10);
    }

    #[test]
    fn escape_allows_one_more_frame() {
        let mut frame_loop = FrameLoop::new();
        frame_loop.finish_frame();

        frame_loop.handle_key(Some(VirtualKeyCode::Escape), ElementState::Pressed);
        assert_eq!(frame_loop.state(), LoopState::ClosingRequested);
        assert!(frame_loop.should_render());

        assert_eq!(frame_loop.finish_frame(), LoopState::Terminated);
        assert_eq!(frame_loop.frames(), 2);
        assert!(!frame_loop.should_render());

        assert_eq!(frame_loop.finish_frame(), LoopState::Terminated);
        assert_eq!(frame_loop.frames(), 2);
    }

    #[test]
    fn other_keys_are_ignored() {
        let mut frame_loop = FrameLoop::new();

        frame_loop.handle_key(Some(VirtualKeyCode::Escape), ElementState::Released);
        frame_loop.handle_key(Some(VirtualKeyCode::Q), ElementState::Pressed);
        frame_loop.handle_key(None, ElementState::Pressed);

        assert_eq!(frame_loop.state(), LoopState::Running);
    }

    #[test]
    fn close_is_one_way() {
        let mut frame_loop = FrameLoop::new();

        frame_loop.request_close();
        frame_loop.request_close();
        assert_eq!(frame_loop.state(), LoopState::ClosingRequested);

        frame_loop.finish_frame();
        frame_loop.request_close();
        frame_loop.handle_key(Some(CLOSE_KEY), ElementState::Pressed);
        assert_eq!(frame_loop.state(), LoopState::Terminated);
    }
}
