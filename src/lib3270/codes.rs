/// TN3270 Protocol Constants and Codes
///
/// Command codes, order codes, AID (Attention Identifier) keys and field
/// attribute bits of the 3270 data stream.
///
/// # References
/// - RFC 1576: TN3270 Current Practices
/// - IBM 3270 Data Stream Programmer's Reference (GA23-0059)

/// 3270 Command Codes
///
/// The leading byte of every host record
pub const CMD_WRITE: u8 = 0x01;                 // Write command
pub const CMD_READ_BUFFER: u8 = 0x02;           // Read Buffer command
pub const CMD_ERASE_WRITE: u8 = 0x05;           // Erase/Write command
pub const CMD_ERASE_WRITE_ALTERNATE: u8 = 0x0D; // Erase/Write Alternate

/// 3270 Order Codes handled by the order processor
pub const ORDER_PT: u8 = 0x05;    // Program Tab
pub const ORDER_SBA: u8 = 0x11;   // Set Buffer Address
pub const ORDER_EUA: u8 = 0x12;   // Erase Unprotected to Address
pub const ORDER_IC: u8 = 0x13;    // Insert Cursor
pub const ORDER_SF: u8 = 0x1D;    // Start Field
pub const ORDER_RA: u8 = 0x3C;    // Repeat to Address

/// 3270 Order Codes recognized but not handled (extended attributes, graphics)
pub const ORDER_GE: u8 = 0x08;    // Graphic Escape
pub const ORDER_SA: u8 = 0x28;    // Set Attribute
pub const ORDER_SFE: u8 = 0x29;   // Start Field Extended
pub const ORDER_MF: u8 = 0x2C;    // Modify Field

/// Write Control Character (WCC) Bits
pub const WCC_RESTORE: u8 = 0x02;

/// AID (Attention Identifier) Keys
pub const AID_NO_AID: u8 = 0x60;
pub const AID_ENTER: u8 = 0x7D;
pub const AID_CLEAR: u8 = 0x6D;
pub const AID_SYSREQ: u8 = 0xF0;

// Program attention keys
pub const AID_PA1: u8 = 0x6C;
pub const AID_PA2: u8 = 0x6E;
pub const AID_PA3: u8 = 0x6B;

// Function keys, PF1..=PF24 in order
pub const AID_PF: [u8; 24] = [
    0xF1, 0xF2, 0xF3, 0xF4, 0xF5, 0xF6, 0xF7, 0xF8, 0xF9, 0x7A, 0x7B, 0x7C,
    0xC1, 0xC2, 0xC3, 0xC4, 0xC5, 0xC6, 0xC7, 0xC8, 0xC9, 0x4A, 0x4B, 0x4C,
];

/// Field Attribute Byte Bits
pub const ATTR_PROTECTED: u8 = 0x20;      // Protected field
pub const ATTR_NUMERIC: u8 = 0x10;        // Numeric field
pub const ATTR_DISPLAY: u8 = 0x0C;        // Display attributes
pub const ATTR_MDT: u8 = 0x01;            // Modified Data Tag

/// Byte written into the screen buffer at a Start Field position and by
/// Erase Unprotected to Address
pub const FIELD_PLACEHOLDER: u8 = 0x40;

/// Host command selected by a record's leading byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandCode {
    Write,
    ReadBuffer,
    EraseWrite,
    EraseWriteAlternate,
}

impl CommandCode {
    /// Convert a byte value to a CommandCode
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            CMD_WRITE => Some(Self::Write),
            CMD_READ_BUFFER => Some(Self::ReadBuffer),
            CMD_ERASE_WRITE => Some(Self::EraseWrite),
            CMD_ERASE_WRITE_ALTERNATE => Some(Self::EraseWriteAlternate),
            _ => None,
        }
    }

    /// Convert CommandCode to byte value
    pub fn to_u8(self) -> u8 {
        match self {
            Self::Write => CMD_WRITE,
            Self::ReadBuffer => CMD_READ_BUFFER,
            Self::EraseWrite => CMD_ERASE_WRITE,
            Self::EraseWriteAlternate => CMD_ERASE_WRITE_ALTERNATE,
        }
    }

    /// Whether this command repaints the screen buffer
    pub fn is_write(self) -> bool {
        matches!(self, Self::Write | Self::EraseWrite | Self::EraseWriteAlternate)
    }
}

/// Classification of one byte of the order stream
///
/// `Unknown` covers 3270 order codes this client does not interpret; only
/// the order byte itself is consumed for them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    InsertCursor,
    ProgramTab,
    SetBufferAddress,
    StartField,
    RepeatToAddress,
    EraseUnprotectedToAddress,
    Unknown(u8),
}

impl Order {
    /// Classify a byte; `None` means the byte is literal data
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            ORDER_IC => Some(Self::InsertCursor),
            ORDER_PT => Some(Self::ProgramTab),
            ORDER_SBA => Some(Self::SetBufferAddress),
            ORDER_SF => Some(Self::StartField),
            ORDER_RA => Some(Self::RepeatToAddress),
            ORDER_EUA => Some(Self::EraseUnprotectedToAddress),
            ORDER_GE | ORDER_SA | ORDER_SFE | ORDER_MF => Some(Self::Unknown(value)),
            _ => None,
        }
    }

    /// Number of operand bytes that follow the order byte
    pub fn operand_len(self) -> usize {
        match self {
            Self::InsertCursor | Self::ProgramTab | Self::Unknown(_) => 0,
            Self::StartField => 1,
            Self::SetBufferAddress | Self::EraseUnprotectedToAddress => 2,
            Self::RepeatToAddress => 3,
        }
    }

    /// Convert to the wire byte
    pub fn to_u8(self) -> u8 {
        match self {
            Self::InsertCursor => ORDER_IC,
            Self::ProgramTab => ORDER_PT,
            Self::SetBufferAddress => ORDER_SBA,
            Self::StartField => ORDER_SF,
            Self::RepeatToAddress => ORDER_RA,
            Self::EraseUnprotectedToAddress => ORDER_EUA,
            Self::Unknown(code) => code,
        }
    }
}

/// Attention keys the client can send
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AidKey {
    NoAid,
    Enter,
    Clear,
    SysReq,
    PA1,
    PA2,
    PA3,
    /// Program function key 1..=24
    PF(u8),
}

impl AidKey {
    /// Convert a byte value to an AidKey
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            AID_NO_AID => Some(Self::NoAid),
            AID_ENTER => Some(Self::Enter),
            AID_CLEAR => Some(Self::Clear),
            AID_SYSREQ => Some(Self::SysReq),
            AID_PA1 => Some(Self::PA1),
            AID_PA2 => Some(Self::PA2),
            AID_PA3 => Some(Self::PA3),
            _ => AID_PF
                .iter()
                .position(|&b| b == value)
                .map(|i| Self::PF(i as u8 + 1)),
        }
    }

    /// Convert AidKey to byte value
    ///
    /// Out-of-range function key numbers fall back to Enter.
    pub fn to_u8(self) -> u8 {
        match self {
            Self::NoAid => AID_NO_AID,
            Self::Enter => AID_ENTER,
            Self::Clear => AID_CLEAR,
            Self::SysReq => AID_SYSREQ,
            Self::PA1 => AID_PA1,
            Self::PA2 => AID_PA2,
            Self::PA3 => AID_PA3,
            Self::PF(n @ 1..=24) => AID_PF[n as usize - 1],
            Self::PF(_) => AID_ENTER,
        }
    }
}

impl Default for AidKey {
    fn default() -> Self {
        Self::Enter
    }
}

impl std::str::FromStr for AidKey {
    type Err = String;

    /// Parse key names such as `enter`, `clear`, `pa2`, `pf12`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        match name.as_str() {
            "enter" => Ok(Self::Enter),
            "clear" => Ok(Self::Clear),
            "sysreq" => Ok(Self::SysReq),
            "noaid" => Ok(Self::NoAid),
            "pa1" => Ok(Self::PA1),
            "pa2" => Ok(Self::PA2),
            "pa3" => Ok(Self::PA3),
            _ => name
                .strip_prefix("pf")
                .and_then(|n| n.parse::<u8>().ok())
                .filter(|n| (1..=24).contains(n))
                .map(Self::PF)
                .ok_or_else(|| format!("Unknown AID key: {s}")),
        }
    }
}
