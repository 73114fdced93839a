//! In-memory serial line.
//!
//! The device end speaks `embedded-hal-nb` one word at a time, the host end
//! speaks `embedded-io` in slices. Both ends share the same FIFO, so a `Line`
//! can be handed to [`crate::SerialReceiver`] while a test pushes bytes in from
//! the other side.

use heapless::Deque;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineError {
    Full { capacity: usize },
}

impl embedded_hal_nb::serial::Error for LineError {
    fn kind(&self) -> embedded_hal_nb::serial::ErrorKind {
        match self {
            LineError::Full { .. } => embedded_hal_nb::serial::ErrorKind::Overrun,
        }
    }
}

impl embedded_io::Error for LineError {
    fn kind(&self) -> embedded_io::ErrorKind {
        match self {
            LineError::Full { .. } => embedded_io::ErrorKind::OutOfMemory,
        }
    }
}

#[derive(Debug, Default)]
pub struct Line<const N: usize> {
    fifo: Deque<u8, N>,
}

impl<const N: usize> Line<N> {
    pub fn new() -> Line<N> {
        Line { fifo: Deque::new() }
    }

    pub fn len(&self) -> usize {
        self.fifo.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fifo.is_empty()
    }

    pub fn clear(&mut self) {
        self.fifo.clear();
    }

    pub fn peek(&self) -> Option<u8> {
        self.fifo.front().copied()
    }
}

impl<const N: usize> embedded_hal_nb::serial::ErrorType for Line<N> {
    type Error = LineError;
}

impl<const N: usize> embedded_hal_nb::serial::Read for Line<N> {
    fn read(&mut self) -> nb::Result<u8, Self::Error> {
        self.fifo.pop_front().ok_or(nb::Error::WouldBlock)
    }
}

impl<const N: usize> embedded_hal_nb::serial::Write for Line<N> {
    /// A full line blocks rather than erroring, the writer is expected to retry.
    fn write(&mut self, word: u8) -> nb::Result<(), Self::Error> {
        self.fifo.push_back(word).map_err(|_| nb::Error::WouldBlock)
    }

    fn flush(&mut self) -> nb::Result<(), Self::Error> {
        Ok(())
    }
}

impl<const N: usize> embedded_io::ErrorType for Line<N> {
    type Error = LineError;
}

impl<const N: usize> embedded_io::Read for Line<N> {
    /// An empty line reads as end of stream.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let mut n = 0;
        for slot in buf.iter_mut() {
            match self.fifo.pop_front() {
                Some(b) => {
                    *slot = b;
                    n += 1;
                }
                None => break,
            }
        }
        Ok(n)
    }
}

impl<const N: usize> embedded_io::Write for Line<N> {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        if buf.is_empty() {
            return Ok(0);
        }
        if self.fifo.is_full() {
            return Err(LineError::Full { capacity: N });
        }
        let mut n = 0;
        for b in buf {
            if self.fifo.push_back(*b).is_err() {
                break;
            }
            n += 1;
        }
        Ok(n)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}
