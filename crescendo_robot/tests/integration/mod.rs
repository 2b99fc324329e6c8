mod autonomous;
mod lifecycle;
mod subsystems;
mod support;
mod teleop;
mod triggers;
