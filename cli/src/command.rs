use common::games::match_three::{InputEvent, Position, SwapRequest};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    Input(InputEvent),
    Hint,
    Board,
    Quit,
}

pub const HELP: &str = "Commands: x1 y1 x2 y2 | swap x1 y1 x2 y2 | press x y | enter x y | release | hint | board | q";

fn coordinates(words: &[&str], expected: usize) -> Result<Vec<usize>, String> {
    if words.len() != expected {
        return Err(format!("expected {} coordinates, got {}", expected, words.len()));
    }
    words
        .iter()
        .map(|word| {
            word.parse::<usize>()
                .map_err(|_| format!("'{}' is not a board coordinate", word))
        })
        .collect()
}

fn swap_from(words: &[&str]) -> Result<Command, String> {
    let c = coordinates(words, 4)?;
    Ok(Command::Input(InputEvent::Swap(SwapRequest::new(
        Position::new(c[0], c[1]),
        Position::new(c[2], c[3]),
    ))))
}

fn position_from(words: &[&str]) -> Result<Position, String> {
    let c = coordinates(words, 2)?;
    Ok(Position::new(c[0], c[1]))
}

/// Parses one line of interactive input. A blank line reprints the board.
pub fn parse_command(line: &str) -> Result<Command, String> {
    let words: Vec<&str> = line.split_whitespace().collect();
    let Some((&head, rest)) = words.split_first() else {
        return Ok(Command::Board);
    };

    match head.to_ascii_lowercase().as_str() {
        "q" | "quit" | "exit" => Ok(Command::Quit),
        "hint" => Ok(Command::Hint),
        "board" => Ok(Command::Board),
        "release" => Ok(Command::Input(InputEvent::Release)),
        "press" => Ok(Command::Input(InputEvent::Press(position_from(rest)?))),
        "enter" => Ok(Command::Input(InputEvent::Enter(position_from(rest)?))),
        "swap" => swap_from(rest),
        _ if head.parse::<usize>().is_ok() => swap_from(&words),
        _ => Err(format!("unknown command '{}'. {}", head, HELP)),
    }
}
