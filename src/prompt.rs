/*============================================================
  Synavera Project: AEM-Purge
  Module: aem_purge::prompt
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Ask the operator yes/no questions before bulk and
    per-package deletion.

  Security / Safety Notes:
    Anything other than an explicit `y` or `n` aborts the run.

  Dependencies:
    std::io only.

  Operational Scope:
    Driven by `main`; generic over reader and writer so the
    answer handling is testable without a terminal.

  Revision History:
    2025-11-12 COD  Authored confirmation prompts.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Unrecognized input is distinct from refusal
============================================================*/

use std::io::{BufRead, Write};

use crate::error::Result;

/// Operator answer to a yes/no question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Yes,
    No,
    Unrecognized,
}

impl Confirmation {
    pub fn from_answer(answer: &str) -> Self {
        match answer.trim() {
            "y" => Confirmation::Yes,
            "n" => Confirmation::No,
            _ => Confirmation::Unrecognized,
        }
    }
}

/// Print `question` followed by ` (y/n): ` and read one line.
///
/// End of input counts as unrecognized.
pub fn ask<R, W>(input: &mut R, output: &mut W, question: &str) -> Result<Confirmation>
where
    R: BufRead,
    W: Write,
{
    write!(output, "{question} (y/n): ")?;
    output.flush()?;

    let mut answer = String::new();
    if input.read_line(&mut answer)? == 0 {
        writeln!(output)?;
        return Ok(Confirmation::Unrecognized);
    }
    Ok(Confirmation::from_answer(&answer))
}
