//! Readable, colorized listings of the instructions a recipe is about to submit.

use std::fmt::{
    self,
    Debug,
    Display,
    Formatter,
};

use colored::{
    Color,
    Colorize,
};
use solana_instruction::Instruction;
use solana_sdk::pubkey::Pubkey;
use solana_system_interface::instruction::SystemInstruction;
use spl_associated_token_account_interface::instruction::AssociatedTokenAccountInstruction;
use spl_token_2022_interface::instruction::TokenInstruction as Token2022Instruction;
use spl_token_interface::instruction::TokenInstruction;
use spl_token_metadata_interface::instruction::TokenMetadataInstruction;

use crate::logs::LogColor;

pub struct PrettyInstruction<'a> {
    pub instruction: &'a Instruction,
}

impl Display for PrettyInstruction<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let program_id = &self.instruction.program_id;
        let known_program = KnownProgram::from_program_id(program_id);

        let name_highlight_color: Color = match known_program {
            Some(_) => LogColor::Debug.into(),
            None => LogColor::Warning.into(),
        };

        let (program_name, instruction_name) = match known_program {
            Some(known) => (
                known.to_string(),
                known.instruction_name(&self.instruction.data),
            ),
            None => (program_id.to_string(), UNKNOWN_INSTRUCTION.into()),
        };

        let colored_name = program_name.color(name_highlight_color);
        write!(f, "{colored_name}::{instruction_name}")
    }
}

/// An ordered instruction list, one indexed line per instruction.
pub struct PrettyInstructions<'a> {
    /// The amount of spaces preceding each line in the output.
    pub indent_size: usize,
    pub instructions: &'a [Instruction],
}

impl Display for PrettyInstructions<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let indentation = " ".repeat(self.indent_size);
        for (i, instruction) in self.instructions.iter().enumerate() {
            let idx = format!("{:>2}", i + 1).color(LogColor::FadedGray);
            writeln!(f, "{idx}{indentation}{}", PrettyInstruction { instruction })?;
        }
        Ok(())
    }
}

const UNKNOWN_INSTRUCTION: &str = "UnknownInstruction";

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "snake_case")]
pub enum KnownProgram {
    SplToken,
    SplToken2022,
    SystemProgram,
    AssociatedTokenAccount,
}

impl KnownProgram {
    pub fn from_program_id(program_id: &Pubkey) -> Option<Self> {
        if *program_id == spl_token_interface::ID {
            Some(Self::SplToken)
        } else if *program_id == spl_token_2022_interface::ID {
            Some(Self::SplToken2022)
        } else if *program_id == solana_system_interface::program::ID {
            Some(Self::SystemProgram)
        } else if *program_id == spl_associated_token_account_interface::program::ID {
            Some(Self::AssociatedTokenAccount)
        } else {
            None
        }
    }

    pub fn instruction_name(&self, instruction_data: &[u8]) -> String {
        let name = match self {
            Self::SplToken => TokenInstruction::unpack(instruction_data)
                .ok()
                .map(|ix| enum_name(&ix)),
            // Token-2022 also serves the token-metadata interface. Its 8-byte discriminators are
            // checked first since their leading byte can collide with a one-byte token tag.
            Self::SplToken2022 => TokenMetadataInstruction::unpack(instruction_data)
                .ok()
                .map(|ix| format!("TokenMetadata{}", enum_name(&ix)))
                .or_else(|| {
                    Token2022Instruction::unpack(instruction_data)
                        .ok()
                        .map(|ix| enum_name(&ix))
                }),
            Self::SystemProgram => bincode::deserialize::<SystemInstruction>(instruction_data)
                .ok()
                .map(|ix| enum_name(&ix)),
            Self::AssociatedTokenAccount => {
                // An empty payload is the legacy encoding of `Create`.
                if instruction_data.is_empty() {
                    Some("Create".into())
                } else {
                    borsh::from_slice::<AssociatedTokenAccountInstruction>(instruction_data)
                        .ok()
                        .map(|ix| enum_name(&ix))
                }
            }
        };
        name.unwrap_or_else(|| UNKNOWN_INSTRUCTION.into())
    }
}

// This should only be used with enums. It assumes that `Debug` will print the value like `Ident {`.
fn enum_name<T: Debug>(value: &T) -> String {
    let s = format!("{:?}", value);
    s.split_once([' ', '{', '('])
        .map(|(n, _)| n)
        .unwrap_or(&s)
        .into()
}

#[cfg(test)]
mod tests {
    use spl_token_2022_interface::instruction::initialize_mint2;

    use super::*;

    #[test]
    fn names_token_2022_instructions() {
        let mint = Pubkey::new_unique();
        let ix = initialize_mint2(&spl_token_2022_interface::ID, &mint, &mint, None, 9).unwrap();
        let known = KnownProgram::from_program_id(&ix.program_id).unwrap();
        assert_eq!(known, KnownProgram::SplToken2022);
        assert_eq!(known.instruction_name(&ix.data), "InitializeMint2");
    }

    #[test]
    fn names_system_instructions() {
        let from = Pubkey::new_unique();
        let to = Pubkey::new_unique();
        let ix = solana_system_interface::instruction::transfer(&from, &to, 10);
        let known = KnownProgram::from_program_id(&ix.program_id).unwrap();
        assert_eq!(known.to_string(), "system_program");
        assert_eq!(known.instruction_name(&ix.data), "Transfer");
    }

    #[test]
    fn names_associated_token_account_instructions() {
        use spl_associated_token_account_interface::instruction::{
            create_associated_token_account,
            create_associated_token_account_idempotent,
        };

        let (payer, owner, mint) = (Pubkey::new_unique(), Pubkey::new_unique(), Pubkey::new_unique());
        let token_program = spl_token_2022_interface::ID;
        let create = create_associated_token_account(&payer, &owner, &mint, &token_program);
        let idempotent =
            create_associated_token_account_idempotent(&payer, &owner, &mint, &token_program);

        let known = KnownProgram::from_program_id(&create.program_id).unwrap();
        assert_eq!(known, KnownProgram::AssociatedTokenAccount);
        assert_eq!(known.instruction_name(&create.data), "Create");
        assert_eq!(known.instruction_name(&idempotent.data), "CreateIdempotent");
        assert_eq!(known.instruction_name(&[]), "Create");
    }

    #[test]
    fn unknown_programs_are_not_named() {
        assert!(KnownProgram::from_program_id(&Pubkey::new_unique()).is_none());
        assert_eq!(
            KnownProgram::SplToken2022.instruction_name(&[255, 255]),
            UNKNOWN_INSTRUCTION
        );
    }
}
