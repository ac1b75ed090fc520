//! Catch-all DNS for the setup access point
//!
//! Every `A` question is answered with the access point address so that
//! connectivity checks and typed URLs reach the portal. Other question types
//! get an empty answer.

use super::Ipv4Octets;

const HEADER_SIZE: usize = 12;
const FLAG_RESPONSE: u16 = 0x8000;
const FLAG_RECURSION_DESIRED: u16 = 0x0100;
const FLAG_RECURSION_AVAILABLE: u16 = 0x0080;
const OPCODE_MASK: u16 = 0x7800;

const TYPE_A: u16 = 1;
const CLASS_IN: u16 = 1;
/// Compression pointer to the name at the start of the question
const NAME_POINTER: [u8; 2] = [0xC0, HEADER_SIZE as u8];
const ANSWER_TTL_SECS: u32 = 60;
const ANSWER_SIZE: usize = 16;

pub const MAX_PACKET_SIZE: usize = 512;

/// Build the answer to `query` into `response`.
///
/// Returns `None` for anything that is not a standard query with one
/// question that fits the buffer.
pub fn build_answer(
    query: &[u8],
    address: Ipv4Octets,
    response: &mut [u8; MAX_PACKET_SIZE],
) -> Option<usize> {
    let header = query.get(..HEADER_SIZE)?;
    let flags = u16::from_be_bytes([header[2], header[3]]);
    let questions = u16::from_be_bytes([header[4], header[5]]);
    if flags & (FLAG_RESPONSE | OPCODE_MASK) != 0 || questions != 1 {
        return None;
    }

    let question_len = question_length(&query[HEADER_SIZE..])?;
    let question = &query[HEADER_SIZE..HEADER_SIZE + question_len];
    let qtype = u16::from_be_bytes([question[question_len - 4], question[question_len - 3]]);
    let qclass = u16::from_be_bytes([question[question_len - 2], question[question_len - 1]]);
    let answers: u16 = u16::from(qtype == TYPE_A && qclass == CLASS_IN);

    let len = HEADER_SIZE + question_len + usize::from(answers) * ANSWER_SIZE;
    if len > response.len() {
        return None;
    }

    let reply_flags =
        FLAG_RESPONSE | FLAG_RECURSION_AVAILABLE | (flags & FLAG_RECURSION_DESIRED);
    response[..2].copy_from_slice(&header[..2]);
    response[2..4].copy_from_slice(&reply_flags.to_be_bytes());
    response[4..6].copy_from_slice(&1u16.to_be_bytes());
    response[6..8].copy_from_slice(&answers.to_be_bytes());
    response[8..HEADER_SIZE].fill(0);
    response[HEADER_SIZE..HEADER_SIZE + question_len].copy_from_slice(question);

    if answers == 1 {
        let answer = &mut response[HEADER_SIZE + question_len..len];
        answer[..2].copy_from_slice(&NAME_POINTER);
        answer[2..4].copy_from_slice(&TYPE_A.to_be_bytes());
        answer[4..6].copy_from_slice(&CLASS_IN.to_be_bytes());
        answer[6..10].copy_from_slice(&ANSWER_TTL_SECS.to_be_bytes());
        answer[10..12].copy_from_slice(&4u16.to_be_bytes());
        answer[12..16].copy_from_slice(&address);
    }

    Some(len)
}

/// Length of the first question: labels, terminator, type and class.
fn question_length(question: &[u8]) -> Option<usize> {
    let mut pos = 0;
    loop {
        let label = usize::from(*question.get(pos)?);
        if label == 0 {
            break;
        }
        // Compressed names never appear in a query's first question.
        if label & 0xC0 != 0 {
            return None;
        }
        pos += 1 + label;
    }
    let len = pos + 1 + 4;
    (len <= question.len()).then_some(len)
}
