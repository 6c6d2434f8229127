//! Widget styles for the form.

mod buttons;
mod containers;
mod inputs;
pub mod palette;
mod shadows;

pub use buttons::{danger_button_style, primary_button_style, secondary_button_style};
pub use containers::{card_style, dialog_backdrop_style, dialog_card_style, surface_style};
pub use inputs::{field_input_style, scrollable_style};
