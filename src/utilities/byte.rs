// Copyright (C) 2025 Bellande Artificial Intelligence Computer Vision Research Innovation Center, Ronaldson Bellande

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.

// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

use std::io::{self, Read};

/// Fixed-width integer reads over any byte stream, used by the JPEG header parser.
pub trait ReadBytes: Read {
    #[inline]
    fn read_u8(&mut self) -> io::Result<u8> {
        let mut buf = [0; 1];
        self.read_exact(&mut buf)?;
        Ok(buf[0])
    }

    fn read_u16<T: Byte>(&mut self) -> io::Result<u16> {
        let mut buf = [0; 2];
        self.read_exact(&mut buf)?;
        Ok(T::read_u16(&buf))
    }

    /// Consumes `count` bytes, failing with `UnexpectedEof` if the stream is shorter.
    fn skip_bytes(&mut self, count: u64) -> io::Result<()>
    where
        Self: Sized,
    {
        let skipped = io::copy(&mut self.by_ref().take(count), &mut io::sink())?;
        if skipped < count {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("wanted {} bytes, stream ended after {}", count, skipped),
            ));
        }
        Ok(())
    }
}

impl<R: Read + ?Sized> ReadBytes for R {}

pub trait Byte {
    fn read_u16(buf: &[u8]) -> u16;
}

/// JPEG segment lengths and frame dimensions are big-endian.
pub enum BigEndian {}

impl Byte for BigEndian {
    #[inline]
    fn read_u16(buf: &[u8]) -> u16 {
        ((buf[0] as u16) << 8) | (buf[1] as u16)
    }
}
