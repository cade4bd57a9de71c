//! Telnet option negotiation filter.
//!
//! OLT CLI ports are usually telnet servers that open with IAC option
//! negotiation. The filter removes those sequences from the data stream and
//! produces minimal answers: server echo and suppress-go-ahead are accepted,
//! every other option is refused.

use std::collections::HashSet;

use memchr::memchr;

const IAC: u8 = 255;
const DONT: u8 = 254;
const DO: u8 = 253;
const WONT: u8 = 252;
const WILL: u8 = 251;
const SB: u8 = 250;
const SE: u8 = 240;

const OPT_ECHO: u8 = 1;
const OPT_SGA: u8 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Data,
    Iac,
    Verb(u8),
    Sub,
    SubIac,
}

/// Stateful IAC stripper; sequences may be split across reads.
#[derive(Debug)]
pub struct TelnetFilter {
    state: State,
    answered: HashSet<(u8, u8)>,
}

impl TelnetFilter {
    pub fn new() -> Self {
        Self {
            state: State::Data,
            answered: HashSet::new(),
        }
    }

    /// Feed raw bytes; plain data goes to `data`, negotiation answers to `replies`.
    pub fn feed(&mut self, mut input: &[u8], data: &mut Vec<u8>, replies: &mut Vec<u8>) {
        while !input.is_empty() {
            if self.state == State::Data {
                match memchr(IAC, input) {
                    Some(pos) => {
                        data.extend_from_slice(&input[..pos]);
                        self.state = State::Iac;
                        input = &input[pos + 1..];
                    }
                    None => {
                        data.extend_from_slice(input);
                        return;
                    }
                }
                continue;
            }

            let byte = input[0];
            input = &input[1..];
            self.state = match self.state {
                State::Iac => match byte {
                    IAC => {
                        data.push(IAC);
                        State::Data
                    }
                    DO | DONT | WILL | WONT => State::Verb(byte),
                    SB => State::Sub,
                    _ => State::Data,
                },
                State::Verb(verb) => {
                    self.answer(verb, byte, replies);
                    State::Data
                }
                State::Sub => {
                    if byte == IAC {
                        State::SubIac
                    } else {
                        State::Sub
                    }
                }
                State::SubIac => {
                    if byte == SE {
                        State::Data
                    } else {
                        State::Sub
                    }
                }
                State::Data => State::Data,
            };
        }
    }

    fn answer(&mut self, verb: u8, option: u8, replies: &mut Vec<u8>) {
        let reply = match verb {
            WILL if matches!(option, OPT_ECHO | OPT_SGA) => DO,
            WILL => DONT,
            DO => WONT,
            // DONT/WONT need no answer when we already refuse everything
            _ => return,
        };
        if self.answered.insert((reply, option)) {
            replies.extend_from_slice(&[IAC, reply, option]);
        }
    }
}

impl Default for TelnetFilter {
    fn default() -> Self {
        Self::new()
    }
}
