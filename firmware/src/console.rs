#![cfg_attr(not(target_os = "none"), allow(dead_code))]

//! Operator console plumbing between the UART task and the control loop.
//!
//! Received bytes arrive through a channel and are read as keyboard symbols.
//! Console text is pushed into a pipe that the UART task drains. Neither side
//! ever waits: a full channel drops keys and a full pipe drops text.

use core::fmt;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::channel::Receiver;
use embassy_sync::pipe::Pipe;
use robot_core::input::InputSource;

pub const KEY_QUEUE_DEPTH: usize = 16;
pub const CONSOLE_PIPE_LEN: usize = 512;

/// Keyboard symbols received on the console UART.
pub struct KeyQueue<'a, M: RawMutex, const N: usize> {
    receiver: Receiver<'a, M, u8, N>,
}

impl<'a, M: RawMutex, const N: usize> KeyQueue<'a, M, N> {
    pub fn new(receiver: Receiver<'a, M, u8, N>) -> Self {
        Self { receiver }
    }
}

impl<M: RawMutex, const N: usize> InputSource for KeyQueue<'_, M, N> {
    type Symbol = u8;

    fn available(&mut self) -> bool {
        !self.receiver.is_empty()
    }

    fn read(&mut self) -> Option<u8> {
        self.receiver.try_receive().ok()
    }
}

/// Console text sink. Line feeds go out as CR LF for serial terminals.
pub struct ConsoleWriter<'a, M: RawMutex, const N: usize> {
    pipe: &'a Pipe<M, N>,
    dropped: u32,
}

impl<'a, M: RawMutex, const N: usize> ConsoleWriter<'a, M, N> {
    pub fn new(pipe: &'a Pipe<M, N>) -> Self {
        Self { pipe, dropped: 0 }
    }

    /// Bytes discarded because the pipe was full.
    pub fn dropped(&self) -> u32 {
        self.dropped
    }

    fn push(&mut self, mut bytes: &[u8]) {
        while !bytes.is_empty() {
            match self.pipe.try_write(bytes) {
                Ok(written) => bytes = &bytes[written..],
                Err(_) => {
                    let lost = u32::try_from(bytes.len()).unwrap_or(u32::MAX);
                    self.dropped = self.dropped.saturating_add(lost);
                    return;
                }
            }
        }
    }
}

impl<M: RawMutex, const N: usize> fmt::Write for ConsoleWriter<'_, M, N> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for (index, line) in s.split('\n').enumerate() {
            if index > 0 {
                self.push(b"\r\n");
            }
            self.push(line.as_bytes());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use core::fmt::Write;

    use embassy_sync::blocking_mutex::raw::NoopRawMutex;
    use embassy_sync::channel::Channel;

    use super::*;

    fn drain<const N: usize>(pipe: &Pipe<NoopRawMutex, N>) -> Vec<u8> {
        let mut buf = [0; N];
        let len = pipe.try_read(&mut buf).unwrap_or(0);
        buf[..len].to_vec()
    }

    #[test]
    fn keys_are_read_in_arrival_order() {
        let channel = Channel::<NoopRawMutex, u8, 4>::new();
        let mut keys = KeyQueue::new(channel.receiver());
        assert!(!keys.available());

        channel.try_send(b'w').expect("room");
        channel.try_send(b'd').expect("room");
        assert!(keys.available());
        assert_eq!(keys.read(), Some(b'w'));
        assert_eq!(keys.read(), Some(b'd'));
        assert_eq!(keys.read(), None);
    }

    #[test]
    fn line_feeds_become_crlf() {
        let pipe = Pipe::<NoopRawMutex, 64>::new();
        let mut console = ConsoleWriter::new(&pipe);
        write!(console, "Saved.\nNext").expect("infallible");
        assert_eq!(drain(&pipe), b"Saved.\r\nNext");
    }

    #[test]
    fn overflow_is_counted_not_blocked() {
        let pipe = Pipe::<NoopRawMutex, 8>::new();
        let mut console = ConsoleWriter::new(&pipe);
        console.write_str("0123456789ab").expect("infallible");
        assert_eq!(console.dropped(), 4);
        assert_eq!(drain(&pipe), b"01234567");
    }
}
