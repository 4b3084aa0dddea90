//! Rendering for reports (text and PNG charts) and the interactive lookup menu

pub mod chart;
pub mod menu;
pub mod plot;

pub use chart::{render_report, Chart};
pub use menu::{LineSource, Menu, MenuState, PipedInput, TerminalInput};
pub use plot::{plots_for, Plot};
