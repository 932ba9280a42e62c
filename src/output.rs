//! Output rendering abstraction for zephyr.
//!
//! Defines the [`Renderer`] trait that decouples the streaming loop from the
//! display layer. [`StdoutRenderer`] prints tokens directly to the terminal;
//! tests substitute a capturing renderer.

use colored::Colorize;
use std::io::{self, Write};

/// Trait for rendering streamed assistant output and tool activity.
pub trait Renderer {
    /// Render a final-answer delta as it arrives.
    fn render_token(&mut self, token: &str);

    /// Render an intermediate thinking delta (display only, never recorded).
    fn render_thinking(&mut self, token: &str);

    /// Called once the turn's stream has ended.
    fn render_done(&mut self);

    /// Called when an error occurs.
    fn render_error(&mut self, err: &str);

    /// Announce one tool iteration of the bounded sub-loop.
    fn tool_iteration(&mut self, current: usize, max: usize);
}

/// Renders streaming output directly to stdout.
///
/// Each delta is printed immediately with an explicit flush so the user sees
/// a "typing" effect. Thinking deltas are dimmed and can be suppressed
/// entirely via configuration.
pub struct StdoutRenderer {
    show_thinking: bool,
    thinking_color: String,
}

impl StdoutRenderer {
    pub fn new(show_thinking: bool, thinking_color: impl Into<String>) -> Self {
        Self {
            show_thinking,
            thinking_color: thinking_color.into(),
        }
    }
}

impl Renderer for StdoutRenderer {
    fn render_token(&mut self, token: &str) {
        print!("{}", token);
        // Flush immediately so each delta appears as it arrives
        io::stdout().flush().ok();
    }

    fn render_thinking(&mut self, token: &str) {
        if !self.show_thinking {
            return;
        }
        if self.thinking_color == "gray" {
            print!("{}", token.dimmed());
        } else {
            print!("{}", token);
        }
        io::stdout().flush().ok();
    }

    fn render_done(&mut self) {
        println!();
    }

    fn render_error(&mut self, err: &str) {
        eprintln!();
        eprintln!("{} {}", "error:".red().bold(), err);
    }

    fn tool_iteration(&mut self, current: usize, max: usize) {
        println!();
        println!("{}", format!("[iteration {}/{}]", current, max).dimmed());
    }
}
