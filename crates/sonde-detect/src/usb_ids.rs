//! USB Vendor/Product ID database for sensor shell boards
//!
//! The shell runs on Arduino hardware. Boards are selected by vendor id
//! alone; product ids are only used to name the board in logs.

/// USB Vendor ID / Product ID pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsbId {
    pub vid: u16,
    pub pid: u16,
}

impl UsbId {
    pub const fn new(vid: u16, pid: u16) -> Self {
        Self { vid, pid }
    }
}

/// Arduino LLC (arduino.cc) boards
pub mod arduino {
    use super::UsbId;

    /// Device signature of the sensor shell board family
    pub const VID: u16 = 0x2341;

    pub const UNO: UsbId = UsbId::new(VID, 0x0001);
    pub const MEGA_2560: UsbId = UsbId::new(VID, 0x0010);
    pub const DUE: UsbId = UsbId::new(VID, 0x003D);
    pub const MEGA_2560_R3: UsbId = UsbId::new(VID, 0x0042);
    pub const UNO_R3: UsbId = UsbId::new(VID, 0x0043);
    pub const LEONARDO: UsbId = UsbId::new(VID, 0x8036);
    pub const MICRO: UsbId = UsbId::new(VID, 0x8037);

    /// All known board product IDs
    pub const ALL: &[UsbId] = &[UNO, MEGA_2560, DUE, MEGA_2560_R3, UNO_R3, LEONARDO, MICRO];
}

/// Arduino SRL (arduino.org) boards, an alternate signature for older revisions
pub mod arduino_org {
    pub const VID: u16 = 0x2A03;
}

/// Name a known board from its USB ids
pub fn board_name(vid: u16, pid: u16) -> Option<&'static str> {
    match UsbId::new(vid, pid) {
        arduino::UNO => Some("Arduino Uno"),
        arduino::MEGA_2560 => Some("Arduino Mega 2560"),
        arduino::DUE => Some("Arduino Due"),
        arduino::MEGA_2560_R3 => Some("Arduino Mega 2560 R3"),
        arduino::UNO_R3 => Some("Arduino Uno R3"),
        arduino::LEONARDO => Some("Arduino Leonardo"),
        arduino::MICRO => Some("Arduino Micro"),
        _ => None,
    }
}
