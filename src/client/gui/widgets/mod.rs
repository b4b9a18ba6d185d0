pub mod hold_button;
