//! 帧编解码
//!
//! 帧格式：1 字节版本 + 4 字节长度（大端序）+ bincode 消息体。
//! 只处理字节，不涉及连接，宿主层可用于任意传输。

use serde::{de::DeserializeOwned, Serialize};

use crate::constants::{MAX_FRAME_SIZE, PROTOCOL_VERSION};
use crate::error::{ProtocolError, Result};

/// 帧头大小: 1 字节版本 + 4 字节长度
pub const HEADER_SIZE: usize = 5;

/// 编码一帧消息
pub fn encode_frame<M: Serialize>(msg: &M) -> Result<Vec<u8>> {
    let payload = bincode::serialize(msg)?;

    if payload.len() > MAX_FRAME_SIZE {
        return Err(ProtocolError::FrameTooLarge {
            size: payload.len(),
            max: MAX_FRAME_SIZE,
        });
    }

    let mut frame = Vec::with_capacity(HEADER_SIZE + payload.len());
    frame.push(PROTOCOL_VERSION);
    frame.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    frame.extend_from_slice(&payload);
    Ok(frame)
}

/// 从缓冲区头部解码一帧消息
///
/// 数据不足一帧时返回 `Ok(None)`，否则返回消息和消耗的字节数。
pub fn decode_frame<M: DeserializeOwned>(buf: &[u8]) -> Result<Option<(M, usize)>> {
    if buf.len() < HEADER_SIZE {
        return Ok(None);
    }

    let version = buf[0];
    if version != PROTOCOL_VERSION {
        return Err(ProtocolError::VersionMismatch {
            expected: PROTOCOL_VERSION,
            actual: version,
        });
    }

    let length = u32::from_be_bytes([buf[1], buf[2], buf[3], buf[4]]) as usize;
    if length > MAX_FRAME_SIZE {
        return Err(ProtocolError::FrameTooLarge {
            size: length,
            max: MAX_FRAME_SIZE,
        });
    }

    let end = HEADER_SIZE + length;
    if buf.len() < end {
        return Ok(None);
    }

    let msg = bincode::deserialize(&buf[HEADER_SIZE..end])?;
    Ok(Some((msg, end)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::ConnectFourState;
    use crate::message::{ClientMessage, ServerMessage};
    use crate::snapshot::GameSnapshot;

    #[test]
    fn test_snapshot_frame() {
        let msg = ServerMessage::State {
            room_id: 3,
            snapshot: GameSnapshot::new(9, None, ConnectFourState::default()),
        };
        let frame = encode_frame(&msg).unwrap();
        assert_eq!(frame[0], PROTOCOL_VERSION);

        let (decoded, used): (ServerMessage, usize) = decode_frame(&frame).unwrap().unwrap();
        assert_eq!(used, frame.len());
        match decoded {
            ServerMessage::State { room_id, snapshot } => {
                assert_eq!(room_id, 3);
                assert_eq!(snapshot.session_id, 9);
            }
            _ => panic!("Unexpected message"),
        }
    }

    #[test]
    fn test_partial_frame() {
        let frame = encode_frame(&ClientMessage::Ping).unwrap();
        assert!(decode_frame::<ClientMessage>(&frame[..3]).unwrap().is_none());
        assert!(decode_frame::<ClientMessage>(&frame[..frame.len() - 1]).unwrap().is_none());
    }

    #[test]
    fn test_two_frames_in_buffer() {
        let mut buf = encode_frame(&ClientMessage::Ping).unwrap();
        buf.extend(encode_frame(&ClientMessage::JoinRoom { room_id: 4 }).unwrap());

        let (first, used): (ClientMessage, usize) = decode_frame(&buf).unwrap().unwrap();
        assert!(matches!(first, ClientMessage::Ping));

        let (second, _): (ClientMessage, usize) = decode_frame(&buf[used..]).unwrap().unwrap();
        assert!(matches!(second, ClientMessage::JoinRoom { room_id: 4 }));
    }

    #[test]
    fn test_version_mismatch() {
        let mut frame = encode_frame(&ClientMessage::Ping).unwrap();
        frame[0] = PROTOCOL_VERSION + 1;
        let err = decode_frame::<ClientMessage>(&frame).unwrap_err();
        assert!(matches!(err, ProtocolError::VersionMismatch { .. }));
    }

    #[test]
    fn test_frame_too_large() {
        let mut frame = vec![PROTOCOL_VERSION];
        frame.extend_from_slice(&((MAX_FRAME_SIZE as u32) + 1).to_be_bytes());
        let err = decode_frame::<ClientMessage>(&frame).unwrap_err();
        assert!(matches!(err, ProtocolError::FrameTooLarge { .. }));
    }
}
