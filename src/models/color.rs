use serde::{Deserialize, Serialize};

/// The sixteen fixed chat colors shared by the legacy codes and the
/// structured color names.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatColor {
    Black,
    DarkBlue,
    DarkGreen,
    DarkAqua,
    DarkRed,
    DarkPurple,
    Gold,
    Gray,
    DarkGray,
    Blue,
    Green,
    Aqua,
    Red,
    LightPurple,
    Yellow,
    White,
}

impl ChatColor {
    pub const ALL: [ChatColor; 16] = [
        ChatColor::Black,
        ChatColor::DarkBlue,
        ChatColor::DarkGreen,
        ChatColor::DarkAqua,
        ChatColor::DarkRed,
        ChatColor::DarkPurple,
        ChatColor::Gold,
        ChatColor::Gray,
        ChatColor::DarkGray,
        ChatColor::Blue,
        ChatColor::Green,
        ChatColor::Aqua,
        ChatColor::Red,
        ChatColor::LightPurple,
        ChatColor::Yellow,
        ChatColor::White,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChatColor::Black => "black",
            ChatColor::DarkBlue => "dark_blue",
            ChatColor::DarkGreen => "dark_green",
            ChatColor::DarkAqua => "dark_aqua",
            ChatColor::DarkRed => "dark_red",
            ChatColor::DarkPurple => "dark_purple",
            ChatColor::Gold => "gold",
            ChatColor::Gray => "gray",
            ChatColor::DarkGray => "dark_gray",
            ChatColor::Blue => "blue",
            ChatColor::Green => "green",
            ChatColor::Aqua => "aqua",
            ChatColor::Red => "red",
            ChatColor::LightPurple => "light_purple",
            ChatColor::Yellow => "yellow",
            ChatColor::White => "white",
        }
    }

    /// Color for a legacy code `0`-`9`, `a`-`f` (either case).
    pub fn from_code(code: char) -> Option<Self> {
        code.to_digit(16).map(|i| Self::ALL[i as usize])
    }

    /// Looks up a structured color name. `reset` is not a color and is
    /// handled by the decoder.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.as_str() == name)
    }
}

impl std::fmt::Display for ChatColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_follow_the_fixed_table() {
        let table = "0123456789abcdef";
        for (code, color) in table.chars().zip(ChatColor::ALL) {
            assert_eq!(ChatColor::from_code(code), Some(color));
        }
        assert_eq!(ChatColor::from_code('c'), Some(ChatColor::Red));
        assert_eq!(ChatColor::from_code('6'), Some(ChatColor::Gold));
        assert_eq!(ChatColor::from_code('g'), None);
    }

    #[test]
    fn names_round_trip() {
        assert_eq!(ChatColor::from_name("light_purple"), Some(ChatColor::LightPurple));
        assert_eq!(ChatColor::from_name("dark_aqua"), Some(ChatColor::DarkAqua));
        assert_eq!(ChatColor::from_name("reset"), None);
        assert_eq!(ChatColor::from_name("purple"), None);
    }
}
