use std::fmt::Display;

use colored::{
    Color,
    Colorize,
};
use solana_sdk::{
    signature::Keypair,
    signer::Signer,
};

/// Column width that labels are padded to so values line up.
pub const DEFAULT_PAD: usize = 13;

#[derive(strum_macros::Display)]
#[strum(serialize_all = "UPPERCASE")]
enum Message {
    Info,
    Success,
    Warning,
    Error,
}

fn log(msg_ty: Message, label: impl Display, msg: impl Display) {
    let color = msg_ty.get_color();
    println!(
        "[{}] {} {}",
        msg_ty.to_string().color(color),
        label.to_string().color(LogColor::Debug),
        msg.to_string().bright_black()
    );
}

impl Message {
    fn get_color(&self) -> LogColor {
        match self {
            Self::Info => LogColor::Info,
            Self::Success => LogColor::Highlight,
            Self::Warning => LogColor::Warning,
            Self::Error => LogColor::Error,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub enum LogColor {
    Highlight,
    Debug,
    Error,
    Warning,
    Header,
    Info,
    FadedGray,
}

/// Pads `label` on the right to `pad` columns.
pub fn pad_label(label: impl Display, pad: usize) -> String {
    format!("{:<pad$}", label.to_string())
}

/// Prints `label : value` with the label padded, e.g. `print_kv!("Mint", mint)`.
#[macro_export]
macro_rules! print_kv {
    ($label:expr, $value:expr $(,)?) => {
        println!(
            "{} : {}",
            $crate::logs::pad_label(&$label, $crate::logs::DEFAULT_PAD),
            $value
        )
    };
}

pub fn title(text: &str) {
    println!();
    println!("{}", text.color(LogColor::Header));
    println!("{}", "=".repeat(text.chars().count()));
    println!();
}

pub fn sub_title(text: &str) {
    println!("{}", text.color(LogColor::Highlight));
    println!("{}", "-".repeat(text.chars().count()));
    println!();
}

pub fn info(text: impl Display) {
    println!("ℹ️ {text}");
}

pub fn info_pair(label: impl Display, value: impl Display) {
    println!("ℹ️ {} : {value}", pad_label(label, DEFAULT_PAD));
}

pub fn display_wallet(name: &str, keypair: &Keypair) {
    println!("💰 {} : {}", pad_label(name, DEFAULT_PAD), keypair.pubkey());
}

pub fn display_transaction_link(name: &str, link: impl Display) {
    println!("🚀 {} : {link}", pad_label(name, DEFAULT_PAD));
}

#[rustfmt::skip]
mod unformatted {
    use super::*;

    pub fn log_info(label: impl Display, msg: impl Display) { log(Message::Info, label, msg) }
    pub fn log_success(label: impl Display, msg: impl Display) { log(Message::Success, label, msg) }
    pub fn log_warning(label: impl Display, msg: impl Display) { log(Message::Warning, label, msg) }
    pub fn log_error(label: impl Display, msg: impl Display) { log(Message::Error, label, msg) }

    impl From<LogColor> for Color {
        fn from(value: LogColor) -> Color {
            match value {
                LogColor::Highlight  => Color::TrueColor { r: 255, g: 215, b: 87  },
                LogColor::Debug      => Color::TrueColor { r: 40, g: 100,  b: 153 },
                LogColor::Error      => Color::TrueColor { r: 255, g: 0,   b: 45  },
                LogColor::Warning    => Color::TrueColor { r: 180, g: 105, b: 0   },
                LogColor::Header     => Color::TrueColor { r: 0,   g: 255, b: 0   },
                LogColor::Info       => Color::TrueColor { r: 0,   g: 95,  b: 255 },
                LogColor::FadedGray  => Color::TrueColor { r: 95,  g: 95,  b: 95  },
            }
        }
    }
}

pub use unformatted::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_are_padded_for_alignment() {
        assert_eq!(pad_label("Payer", DEFAULT_PAD), "Payer        ");
        assert_eq!(pad_label("Signature", 4), "Signature");
    }

    #[test]
    fn message_tags_and_colors() {
        assert_eq!(Message::Success.to_string(), "SUCCESS");
        assert!(matches!(Message::Success.get_color(), LogColor::Highlight));
        assert!(matches!(Message::Error.get_color(), LogColor::Error));
    }
}
