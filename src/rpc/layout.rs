use crate::error::ProviderError;
use crate::identity::{PUBKEY_BYTES, WalletAddress};

pub const MAX_STRING_LEN: usize = 1024;

/// Sequential reader over borsh-style account data.
pub struct AccountCursor<'a> {
    data: &'a [u8],
    offset: usize,
    provider: &'static str,
}

impl<'a> AccountCursor<'a> {
    pub fn new(data: &'a [u8], provider: &'static str) -> Self {
        Self {
            data,
            offset: 0,
            provider,
        }
    }

    pub fn skip(&mut self, len: usize) -> Result<(), ProviderError> {
        self.take(len).map(|_| ())
    }

    pub fn read_u8(&mut self) -> Result<u8, ProviderError> {
        let bytes = self.take(1)?;
        Ok(bytes[0])
    }

    pub fn read_u32(&mut self) -> Result<u32, ProviderError> {
        let bytes = self.take(4)?;
        let mut buf = [0u8; 4];
        buf.copy_from_slice(bytes);
        Ok(u32::from_le_bytes(buf))
    }

    pub fn read_u64(&mut self) -> Result<u64, ProviderError> {
        let bytes = self.take(8)?;
        let mut buf = [0u8; 8];
        buf.copy_from_slice(bytes);
        Ok(u64::from_le_bytes(buf))
    }

    pub fn read_pubkey(&mut self) -> Result<WalletAddress, ProviderError> {
        let bytes = self.take(PUBKEY_BYTES)?;
        let mut buf = [0u8; PUBKEY_BYTES];
        buf.copy_from_slice(bytes);
        Ok(WalletAddress::from_bytes(buf))
    }

    /// A `u32` length-prefixed UTF-8 string. Fixed-width fields padded with
    /// NUL bytes come back trimmed.
    pub fn read_string(&mut self) -> Result<String, ProviderError> {
        let len = self.read_u32()? as usize;
        if len > MAX_STRING_LEN {
            return Err(ProviderError::account_data(
                self.provider,
                format!("string length {len} exceeds {MAX_STRING_LEN}"),
            ));
        }
        let bytes = self.take(len)?;
        let text = std::str::from_utf8(bytes).map_err(|err| {
            ProviderError::account_data(self.provider, format!("string is not UTF-8: {err}"))
        })?;
        Ok(text.trim_end_matches('\0').to_string())
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], ProviderError> {
        let end = self.offset.checked_add(len).filter(|end| *end <= self.data.len());
        let Some(end) = end else {
            return Err(ProviderError::account_data(
                self.provider,
                format!(
                    "needed {len} bytes at offset {}, account holds {}",
                    self.offset,
                    self.data.len()
                ),
            ));
        };
        let slice = &self.data[self.offset..end];
        self.offset = end;
        Ok(slice)
    }
}
