// Interface adapters: wire protocol, connection handling and device/surface adapters.

pub mod console;
pub mod net;
pub mod protocol;
pub mod surface;
