//! Window loop state machine.
//!
//! The loop is either running or stopped. Escape, window destruction and the
//! quit message all move it to stopped; only the first of them counts.

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RunState {
    #[default]
    Running,
    Stopped,
}

/// Input the window procedure and message pump feed into the loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopEvent {
    EscapePressed,
    Destroyed,
    /// The quit message was dequeued; carries its `wParam`.
    Quit(i32),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoopControl {
    state: RunState,
    exit_code: i32,
}

impl LoopControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == RunState::Running
    }

    /// Value the process should return after a normal quit: the parameter of
    /// the last message taken off the queue.
    pub fn exit_code(&self) -> i32 {
        self.exit_code
    }

    /// Records a message taken off the queue. Returns `true` when it should be
    /// dispatched; the quit message stops the loop instead.
    pub fn on_message(&mut self, param: i32, is_quit: bool) -> bool {
        self.exit_code = param;
        if is_quit {
            self.handle(LoopEvent::Quit(param));
            return false;
        }
        true
    }

    /// Applies `event`. Returns `true` only for the event that stopped the loop.
    pub fn handle(&mut self, event: LoopEvent) -> bool {
        if let LoopEvent::Quit(code) = event {
            self.exit_code = code;
        }

        match self.state {
            RunState::Running => {
                self.state = RunState::Stopped;
                true
            }
            RunState::Stopped => false,
        }
    }
}
