use bytes::BytesMut;

use crate::{resp_value::RespValue, story::StoryId};

#[derive(Debug)]
pub enum Response {
    Pong,
    Ok,
    Added(StoryId),
    Stories(Vec<StorySummary>),
    /// Viewer index after a navigation, `None` once closed.
    Navigated(Option<usize>),
    Viewer(Option<ViewerFrame>),
    Swept(usize),
    Error(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct StorySummary {
    pub id: StoryId,
    pub timestamp: u64,
    pub label: String,
}

/// Everything needed to draw the open viewer.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewerFrame {
    pub index: usize,
    pub count: usize,
    pub progress: f64,
    pub segments: Vec<f64>,
    pub label: String,
    pub id: StoryId,
    pub image: String,
}

impl Response {
    pub fn serialize(&self, buf: &mut BytesMut) {
        let response_value = match self {
            Response::Pong => RespValue::SimpleString("PONG"),
            Response::Ok => RespValue::SimpleString("OK"),
            Response::Added(id) => RespValue::Integer(*id as i64),
            Response::Stories(stories) => RespValue::Array(
                stories
                    .iter()
                    .map(|story| {
                        RespValue::Array(vec![
                            RespValue::Integer(story.id as i64),
                            RespValue::Integer(story.timestamp as i64),
                            RespValue::BulkString(&story.label),
                        ])
                    })
                    .collect(),
            ),
            Response::Navigated(index) => match index {
                Some(index) => RespValue::Integer(*index as i64),
                None => RespValue::NullBulkString,
            },
            Response::Viewer(frame) => match frame {
                Some(frame) => RespValue::Array(vec![
                    RespValue::Integer(frame.index as i64),
                    RespValue::Integer(frame.count as i64),
                    RespValue::Double(frame.progress),
                    RespValue::Array(frame.segments.iter().map(|s| RespValue::Double(*s)).collect()),
                    RespValue::BulkString(&frame.label),
                    RespValue::Integer(frame.id as i64),
                    RespValue::BulkString(&frame.image),
                ]),
                None => RespValue::NullArray,
            },
            Response::Swept(removed) => RespValue::Integer(*removed as i64),
            Response::Error(message) => RespValue::OwnedSimpleError(format!("ERR {}", message)),
        };
        response_value.serialize(buf);
    }
}

#[cfg(test)]
mod tests {
    use bytes::BytesMut;

    use super::{Response, StorySummary, ViewerFrame};

    fn serialized(response: Response) -> Vec<u8> {
        let mut buf = BytesMut::new();
        response.serialize(&mut buf);
        buf.to_vec()
    }

    #[test]
    fn simple() {
        assert_eq!(serialized(Response::Pong), b"+PONG\r\n");
        assert_eq!(serialized(Response::Ok), b"+OK\r\n");
        assert_eq!(serialized(Response::Added(42)), b":42\r\n");
        assert_eq!(serialized(Response::Swept(2)), b":2\r\n");
    }

    #[test]
    fn navigated() {
        assert_eq!(serialized(Response::Navigated(Some(3))), b":3\r\n");
        assert_eq!(serialized(Response::Navigated(None)), b"$-1\r\n");
    }

    #[test]
    fn error() {
        assert_eq!(
            serialized(Response::Error("no stories to view".to_string())),
            b"-ERR no stories to view\r\n"
        );
    }

    #[test]
    fn stories() {
        assert_eq!(serialized(Response::Stories(vec![])), b"*0\r\n");
        let response = Response::Stories(vec![StorySummary {
            id: 5,
            timestamp: 5,
            label: "Just now".to_string(),
        }]);
        assert_eq!(
            serialized(response),
            b"*1\r\n*3\r\n:5\r\n:5\r\n$8\r\nJust now\r\n"
        );
    }

    #[test]
    fn viewer() {
        assert_eq!(serialized(Response::Viewer(None)), b"*-1\r\n");
        let frame = ViewerFrame {
            index: 1,
            count: 2,
            progress: 50.0,
            segments: vec![100.0, 50.0],
            label: "1m ago".to_string(),
            id: 9,
            image: "data:image/jpeg;base64,AA".to_string(),
        };
        assert_eq!(
            serialized(Response::Viewer(Some(frame))),
            &b"*7\r\n:1\r\n:2\r\n,50\r\n*2\r\n,100\r\n,50\r\n$6\r\n1m ago\r\n:9\r\n$25\r\ndata:image/jpeg;base64,AA\r\n"[..]
        );
    }
}
