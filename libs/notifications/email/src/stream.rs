use messaging::StreamConfig;

/// Stream layout for email notifications.
pub struct NotifStream;

impl StreamConfig for NotifStream {
    const STREAM_NAME: &'static str = "NOTIFS";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_names_from_the_stream() {
        assert_eq!(NotifStream::STREAM_NAME, "NOTIFS");
        assert_eq!(NotifStream::subject(), "NOTIFS.send");
        assert_eq!(NotifStream::durable_name(), "NOTIFS_pullSub");
        assert_eq!(NotifStream::subjects(), vec!["NOTIFS.*".to_string()]);
    }
}
