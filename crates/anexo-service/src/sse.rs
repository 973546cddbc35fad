//! Incremental decoder for `text/event-stream` bodies.

/// One dispatched server-sent event. Comment-only frames (keep-alives)
/// are never produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SseFrame {
    pub event: String,
    pub data: String,
}

/// Buffers raw body chunks and yields complete frames. Chunks may split
/// lines and multi-byte characters anywhere.
#[derive(Debug, Default)]
pub(crate) struct SseDecoder {
    buf: Vec<u8>,
}

impl SseDecoder {
    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        self.buf.extend_from_slice(chunk);
        let mut frames = Vec::new();
        while let Some((at, sep)) = frame_end(&self.buf) {
            let raw: Vec<u8> = self.buf.drain(..at + sep).collect();
            if let Some(frame) = parse_frame(&String::from_utf8_lossy(&raw[..at])) {
                frames.push(frame);
            }
        }
        frames
    }
}

/// Offset of the first blank line and the length of its terminator.
fn frame_end(buf: &[u8]) -> Option<(usize, usize)> {
    for i in 0..buf.len() {
        if buf[i..].starts_with(b"\n\n") {
            return Some((i, 2));
        }
        if buf[i..].starts_with(b"\r\n\r\n") {
            return Some((i, 4));
        }
    }
    None
}

fn parse_frame(text: &str) -> Option<SseFrame> {
    let mut event = None;
    let mut data: Vec<&str> = Vec::new();
    for line in text.lines() {
        if line.starts_with(':') {
            continue;
        }
        let (field, value) = match line.split_once(':') {
            Some((f, v)) => (f, v.strip_prefix(' ').unwrap_or(v)),
            None => (line, ""),
        };
        match field {
            "event" => event = Some(value.to_string()),
            "data" => data.push(value),
            _ => {}
        }
    }
    if data.is_empty() {
        return None;
    }
    Some(SseFrame {
        event: event.unwrap_or_else(|| "message".into()),
        data: data.join("\n"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_split_across_chunks() {
        let mut d = SseDecoder::default();
        assert!(d.push(b"event: created\nda").is_empty());
        let frames = d.push(b"ta: {\"id\":\"1\"}\n\nevent: deleted\ndata: {}\n\n");
        assert_eq!(
            frames,
            vec![
                SseFrame {
                    event: "created".into(),
                    data: "{\"id\":\"1\"}".into()
                },
                SseFrame {
                    event: "deleted".into(),
                    data: "{}".into()
                },
            ]
        );
    }

    #[test]
    fn keep_alives_are_skipped() {
        let mut d = SseDecoder::default();
        assert!(d.push(b":\n\n: ping\n\n").is_empty());
        let frames = d.push(b"data: a\r\ndata: b\r\n\r\n");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].event, "message");
        assert_eq!(frames[0].data, "a\nb");
    }

    #[test]
    fn multibyte_text_split_mid_character() {
        let body = "event: created\ndata: Relatório\n\n".as_bytes();
        let cut = body.iter().position(|&b| b >= 0x80).unwrap() + 1;
        let mut d = SseDecoder::default();
        assert!(d.push(&body[..cut]).is_empty());
        let frames = d.push(&body[cut..]);
        assert_eq!(frames[0].data, "Relatório");
    }
}
