use bytes::Buf;

use crate::constants::{AUTH_REJECTED, HEARTBEAT_RESPONSE_LEN, HEARTBEAT_RESPONSE_MAGIC};
use crate::error::ResponseError;

/// Server reply to a heartbeat
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeartbeatResponse {
    pub authenticated: bool,
    /// Size of the heartbeat the server received intact
    pub tested_len: i16,
    pub ts_forwarded: i32,
    pub ts_lost: i32,
}

impl HeartbeatResponse {
    pub fn decode(mut data: &[u8]) -> Result<Self, ResponseError> {
        if data.len() < HEARTBEAT_RESPONSE_LEN {
            return Err(ResponseError::Short(data.len()));
        }
        let magic = data.get_u16_le();
        if magic != HEARTBEAT_RESPONSE_MAGIC {
            return Err(ResponseError::BadMagic(magic));
        }
        Ok(Self {
            authenticated: data.get_u8() != AUTH_REJECTED,
            tested_len: data.get_i16_le(),
            ts_forwarded: data.get_i32_le(),
            ts_lost: data.get_i32_le(),
        })
    }

    #[cfg(test)]
    pub(crate) fn encode(&self) -> Vec<u8> {
        use bytes::BufMut;

        let mut v = Vec::with_capacity(HEARTBEAT_RESPONSE_LEN);
        v.put_u16_le(HEARTBEAT_RESPONSE_MAGIC);
        v.put_u8(if self.authenticated { 0x01 } else { AUTH_REJECTED });
        v.put_i16_le(self.tested_len);
        v.put_i32_le(self.ts_forwarded);
        v.put_i32_le(self.ts_lost);
        v
    }
}
