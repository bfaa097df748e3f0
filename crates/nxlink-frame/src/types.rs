//! NX-584 message numbers.
//!
//! Numbers 0x01-0x1F travel from the panel to the host; 0x21-0x3F are host
//! commands. The first payload byte carries the number in its low six bits
//! and the acknowledge-required flag in bit 7.

/// Bit 7 of the first payload byte: the host must answer with an ACK.
pub const ACK_REQUIRED_FLAG: u8 = 0x80;

/// Mask selecting the message number from the first payload byte.
pub const MESSAGE_TYPE_MASK: u8 = 0x3F;

// Panel to host.
pub const INTERFACE_CONFIGURATION: u8 = 0x01;
pub const ZONE_NAME: u8 = 0x03;
pub const ZONE_STATUS: u8 = 0x04;
pub const ZONES_SNAPSHOT: u8 = 0x05;
pub const PARTITION_STATUS: u8 = 0x06;
pub const PARTITIONS_SNAPSHOT: u8 = 0x07;
pub const SYSTEM_STATUS: u8 = 0x08;
pub const X10_MESSAGE_RECEIVED: u8 = 0x09;
pub const LOG_EVENT: u8 = 0x0A;
pub const KEYPAD_MESSAGE_RECEIVED: u8 = 0x0B;
pub const PROGRAM_DATA_REPLY: u8 = 0x10;
pub const USER_INFORMATION_REPLY: u8 = 0x12;
pub const COMMAND_FAILED: u8 = 0x1C;
pub const POSITIVE_ACKNOWLEDGE: u8 = 0x1D;
pub const NEGATIVE_ACKNOWLEDGE: u8 = 0x1E;
pub const MESSAGE_REJECTED: u8 = 0x1F;

// Host to panel.
pub const INTERFACE_CONFIGURATION_REQUEST: u8 = 0x21;
pub const ZONE_NAME_REQUEST: u8 = 0x23;
pub const ZONE_STATUS_REQUEST: u8 = 0x24;
pub const ZONES_SNAPSHOT_REQUEST: u8 = 0x25;
pub const PARTITION_STATUS_REQUEST: u8 = 0x26;
pub const PARTITIONS_SNAPSHOT_REQUEST: u8 = 0x27;
pub const SYSTEM_STATUS_REQUEST: u8 = 0x28;
pub const SEND_X10_MESSAGE: u8 = 0x29;
pub const LOG_EVENT_REQUEST: u8 = 0x2A;
pub const SEND_KEYPAD_TEXT_MESSAGE: u8 = 0x2B;
pub const KEYPAD_TERMINAL_MODE_REQUEST: u8 = 0x2C;
pub const PROGRAM_DATA_REQUEST: u8 = 0x30;
pub const PROGRAM_DATA_COMMAND: u8 = 0x31;
pub const USER_INFORMATION_REQUEST_WITH_PIN: u8 = 0x32;
pub const USER_INFORMATION_REQUEST_WITHOUT_PIN: u8 = 0x33;
pub const SET_USER_CODE_WITH_PIN: u8 = 0x34;
pub const SET_USER_CODE_WITHOUT_PIN: u8 = 0x35;
pub const SET_USER_AUTHORIZATION_WITH_PIN: u8 = 0x36;
pub const SET_USER_AUTHORIZATION_WITHOUT_PIN: u8 = 0x37;
pub const STORE_COMMUNICATION_EVENT: u8 = 0x3A;
pub const SET_CLOCK_CALENDAR: u8 = 0x3B;
pub const PRIMARY_KEYPAD_FUNCTION_WITH_PIN: u8 = 0x3C;
pub const PRIMARY_KEYPAD_FUNCTION_WITHOUT_PIN: u8 = 0x3D;
pub const SECONDARY_KEYPAD_FUNCTION: u8 = 0x3E;
pub const ZONE_BYPASS_TOGGLE: u8 = 0x3F;

/// Returns a human-readable name for a message number.
pub fn message_name(kind: u8) -> &'static str {
    match kind & MESSAGE_TYPE_MASK {
        INTERFACE_CONFIGURATION => "Interface Configuration",
        ZONE_NAME => "Zone Name",
        ZONE_STATUS => "Zone Status",
        ZONES_SNAPSHOT => "Zones Snapshot",
        PARTITION_STATUS => "Partition Status",
        PARTITIONS_SNAPSHOT => "Partitions Snapshot",
        SYSTEM_STATUS => "System Status",
        X10_MESSAGE_RECEIVED => "X-10 Message Received",
        LOG_EVENT => "Log Event",
        KEYPAD_MESSAGE_RECEIVED => "Keypad Message Received",
        PROGRAM_DATA_REPLY => "Program Data Reply",
        USER_INFORMATION_REPLY => "User Information Reply",
        COMMAND_FAILED => "Command/Request Failed",
        POSITIVE_ACKNOWLEDGE => "Positive Acknowledge",
        NEGATIVE_ACKNOWLEDGE => "Negative Acknowledge",
        MESSAGE_REJECTED => "Message Rejected",
        INTERFACE_CONFIGURATION_REQUEST => "Interface Configuration Request",
        ZONE_NAME_REQUEST => "Zone Name Request",
        ZONE_STATUS_REQUEST => "Zone Status Request",
        ZONES_SNAPSHOT_REQUEST => "Zones Snapshot Request",
        PARTITION_STATUS_REQUEST => "Partition Status Request",
        PARTITIONS_SNAPSHOT_REQUEST => "Partitions Snapshot Request",
        SYSTEM_STATUS_REQUEST => "System Status Request",
        SEND_X10_MESSAGE => "Send X-10 Message",
        LOG_EVENT_REQUEST => "Log Event Request",
        SEND_KEYPAD_TEXT_MESSAGE => "Send Keypad Text Message",
        KEYPAD_TERMINAL_MODE_REQUEST => "Keypad Terminal Mode Request",
        PROGRAM_DATA_REQUEST => "Program Data Request",
        PROGRAM_DATA_COMMAND => "Program Data Command",
        USER_INFORMATION_REQUEST_WITH_PIN => "User Information Request (PIN)",
        USER_INFORMATION_REQUEST_WITHOUT_PIN => "User Information Request",
        SET_USER_CODE_WITH_PIN => "Set User Code (PIN)",
        SET_USER_CODE_WITHOUT_PIN => "Set User Code",
        SET_USER_AUTHORIZATION_WITH_PIN => "Set User Authorization (PIN)",
        SET_USER_AUTHORIZATION_WITHOUT_PIN => "Set User Authorization",
        STORE_COMMUNICATION_EVENT => "Store Communication Event",
        SET_CLOCK_CALENDAR => "Set Clock/Calendar",
        PRIMARY_KEYPAD_FUNCTION_WITH_PIN => "Primary Keypad Function (PIN)",
        PRIMARY_KEYPAD_FUNCTION_WITHOUT_PIN => "Primary Keypad Function",
        SECONDARY_KEYPAD_FUNCTION => "Secondary Keypad Function",
        ZONE_BYPASS_TOGGLE => "Zone Bypass Toggle",
        _ => "Unknown",
    }
}

/// Message numbers the panel may answer a host command with.
///
/// Every command can also be refused with [`COMMAND_FAILED`] or
/// [`MESSAGE_REJECTED`]. Panel-originated and unknown numbers expect nothing.
pub fn reply_types(kind: u8) -> &'static [u8] {
    match kind & MESSAGE_TYPE_MASK {
        INTERFACE_CONFIGURATION_REQUEST => {
            &[INTERFACE_CONFIGURATION, COMMAND_FAILED, MESSAGE_REJECTED]
        }
        ZONE_NAME_REQUEST => &[ZONE_NAME, COMMAND_FAILED, MESSAGE_REJECTED],
        ZONE_STATUS_REQUEST => &[ZONE_STATUS, COMMAND_FAILED, MESSAGE_REJECTED],
        ZONES_SNAPSHOT_REQUEST => &[ZONES_SNAPSHOT, COMMAND_FAILED, MESSAGE_REJECTED],
        PARTITION_STATUS_REQUEST => &[PARTITION_STATUS, COMMAND_FAILED, MESSAGE_REJECTED],
        PARTITIONS_SNAPSHOT_REQUEST => &[PARTITIONS_SNAPSHOT, COMMAND_FAILED, MESSAGE_REJECTED],
        SYSTEM_STATUS_REQUEST => &[SYSTEM_STATUS, COMMAND_FAILED, MESSAGE_REJECTED],
        LOG_EVENT_REQUEST => &[LOG_EVENT, COMMAND_FAILED, MESSAGE_REJECTED],
        PROGRAM_DATA_REQUEST => &[PROGRAM_DATA_REPLY, COMMAND_FAILED, MESSAGE_REJECTED],
        USER_INFORMATION_REQUEST_WITH_PIN
        | USER_INFORMATION_REQUEST_WITHOUT_PIN
        | SET_USER_CODE_WITH_PIN
        | SET_USER_CODE_WITHOUT_PIN => &[USER_INFORMATION_REPLY, COMMAND_FAILED, MESSAGE_REJECTED],
        SEND_X10_MESSAGE
        | SEND_KEYPAD_TEXT_MESSAGE
        | KEYPAD_TERMINAL_MODE_REQUEST
        | PROGRAM_DATA_COMMAND
        | SET_USER_AUTHORIZATION_WITH_PIN
        | SET_USER_AUTHORIZATION_WITHOUT_PIN
        | STORE_COMMUNICATION_EVENT
        | SET_CLOCK_CALENDAR
        | PRIMARY_KEYPAD_FUNCTION_WITH_PIN
        | PRIMARY_KEYPAD_FUNCTION_WITHOUT_PIN
        | SECONDARY_KEYPAD_FUNCTION
        | ZONE_BYPASS_TOGGLE => &[POSITIVE_ACKNOWLEDGE, COMMAND_FAILED, MESSAGE_REJECTED],
        _ => &[],
    }
}

/// Returns true for numbers the panel sends to the host.
pub fn is_panel_message(kind: u8) -> bool {
    (kind & MESSAGE_TYPE_MASK) < 0x20
}
