use std::fs;
use std::path::Path;

use chrono::Utc;
use layer_watch::{ChatRef, Deletion, Edit, EventLogger, FileSink, Received};

fn read_lines(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .unwrap_or_default()
        .lines()
        .map(str::to_string)
        .collect()
}

fn logger_in(dir: &Path) -> EventLogger<FileSink> {
    EventLogger::new(FileSink::new(dir))
}

#[test]
fn deleted_ids_produce_one_line_each() {
    let tmp  = tempfile::tempdir().unwrap();
    let logs = tmp.path().join("logs");
    let logger = logger_in(&logs);

    logger.on_message_deleted(Deletion {
        chat:        ChatRef::new(1001, Some("Family".into())),
        message_ids: vec![55, 56],
        at:          Utc::now(),
    });

    let lines = read_lines(&logs.join("deleted_messages_1001.log"));
    assert_eq!(lines.len(), 2);
    assert!(lines[0].contains("msg=55"));
    assert!(lines[1].contains("msg=56"));
    for line in &lines {
        assert!(line.contains(r#"chat="Family" (1001)"#));
        // RFC 3339 timestamp up front
        assert_eq!(line.as_bytes()[4], b'-');
        assert!(line[..20].ends_with('Z'));
    }
    assert!(!logs.join("errors.log").exists());
}

#[test]
fn edit_line_has_old_and_new_text() {
    let tmp  = tempfile::tempdir().unwrap();
    let logs = tmp.path().join("logs");
    let logger = logger_in(&logs);

    logger.on_message_edited(Edit {
        chat:       ChatRef::new(2002, Some("Work".into())),
        message_id: 77,
        old_text:   Some("hello".into()),
        new_text:   "hello world".into(),
        sender:     None,
        at:         Utc::now(),
    });

    let lines = read_lines(&logs.join("edited_messages_2002.log"));
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains(r#"old="hello""#));
    assert!(lines[0].contains(r#"new="hello world""#));
    assert!(lines[0].contains("msg=77"));
}

#[test]
fn received_line_has_id_and_full_text() {
    let tmp  = tempfile::tempdir().unwrap();
    let logger = logger_in(tmp.path());
    let text = "a rather long message, with punctuation: ✓ and emoji 🦀";

    logger.on_new_message(Received {
        chat:       ChatRef::new(-42, Some("Group".into())),
        message_id: 9001,
        text:       text.into(),
        sender:     Some("Ann Lee".into()),
        at:         Utc::now(),
    });

    let lines = read_lines(&tmp.path().join("received_messages_-42.log"));
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains("msg=9001"));
    assert!(lines[0].contains(text));
    assert!(lines[0].contains(r#"from="Ann Lee""#));
}

#[test]
fn existing_log_dir_and_files_are_only_appended_to() {
    let tmp  = tempfile::tempdir().unwrap();
    let logs = tmp.path().join("logs");
    fs::create_dir_all(&logs).unwrap();
    fs::write(logs.join("received_messages_7.log"), "old line\n").unwrap();
    fs::write(logs.join("unrelated.txt"), "keep me").unwrap();

    let logger = logger_in(&logs);
    logger.on_new_message(Received {
        chat:       ChatRef::new(7, None),
        message_id: 1,
        text:       "new".into(),
        sender:     None,
        at:         Utc::now(),
    });

    let lines = read_lines(&logs.join("received_messages_7.log"));
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0], "old line");
    assert_eq!(fs::read_to_string(logs.join("unrelated.txt")).unwrap(), "keep me");
}

#[test]
fn failed_write_lands_in_error_log_once() {
    let tmp  = tempfile::tempdir().unwrap();
    let logs = tmp.path().to_path_buf();
    // Occupy the target path with a directory so opening it fails.
    fs::create_dir(logs.join("deleted_messages_1001.log")).unwrap();

    let logger = logger_in(&logs);
    logger.on_message_deleted(Deletion {
        chat:        ChatRef::new(1001, None),
        message_ids: vec![55, 56],
        at:          Utc::now(),
    });

    let errors = read_lines(&logs.join("errors.log"));
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("on_message_deleted"));
    assert!(errors[0].contains("chat=1001"));
    assert!(errors[0].contains("[55, 56]"));

    // The logger keeps working for other chats.
    logger.on_message_deleted(Deletion {
        chat:        ChatRef::new(1002, None),
        message_ids: vec![1],
        at:          Utc::now(),
    });
    assert_eq!(read_lines(&logs.join("deleted_messages_1002.log")).len(), 1);
    assert_eq!(read_lines(&logs.join("errors.log")).len(), 1);
}

#[test]
fn full_lifecycle_of_one_message() {
    let tmp = tempfile::tempdir().unwrap();
    let logger = logger_in(tmp.path());

    logger.on_new_message(Received {
        chat:       ChatRef::new(5, Some("Bob".into())),
        message_id: 3,
        text:       "draft".into(),
        sender:     Some("@bob".into()),
        at:         Utc::now(),
    });
    logger.on_message_edited(Edit {
        chat:       ChatRef::new(5, Some("Bob".into())),
        message_id: 3,
        old_text:   None,
        new_text:   "final".into(),
        sender:     None,
        at:         Utc::now(),
    });
    // Plain deletions carry no chat; history resolves it.
    logger.on_message_deleted(Deletion {
        chat:        ChatRef::unknown(),
        message_ids: vec![3],
        at:          Utc::now(),
    });

    let edited = read_lines(&tmp.path().join("edited_messages_5.log"));
    assert!(edited[0].contains(r#"old="draft" | new="final""#));

    let deleted = read_lines(&tmp.path().join("deleted_messages_5.log"));
    assert_eq!(deleted.len(), 1);
    assert!(deleted[0].contains(r#"from="@bob" | text="final""#));
    assert!(!tmp.path().join("deleted_messages_unknown.log").exists());
}

#[test]
fn quotes_backslashes_and_joined_emoji_are_verbatim() {
    let tmp = tempfile::tempdir().unwrap();
    let logger = logger_in(tmp.path());
    let text = "he said \"hi\" C:\\tmp 👨\u{200d}👩\u{200d}👧";

    logger.on_new_message(Received {
        chat:       ChatRef::new(8, None),
        message_id: 1,
        text:       text.into(),
        sender:     None,
        at:         Utc::now(),
    });

    let lines = read_lines(&tmp.path().join("received_messages_8.log"));
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains(text), "{}", lines[0]);
}

#[test]
fn blocked_chat_file_spares_other_chats_of_the_same_deletion() {
    let tmp  = tempfile::tempdir().unwrap();
    let logs = tmp.path().to_path_buf();
    fs::create_dir(logs.join("deleted_messages_1.log")).unwrap();

    let logger = logger_in(&logs);
    for (chat, id, text) in [(1, 10, "one"), (2, 20, "two")] {
        logger.on_new_message(Received {
            chat:       ChatRef::new(chat, None),
            message_id: id,
            text:       text.into(),
            sender:     None,
            at:         Utc::now(),
        });
    }
    logger.on_message_deleted(Deletion {
        chat:        ChatRef::unknown(),
        message_ids: vec![10, 20],
        at:          Utc::now(),
    });

    let other = read_lines(&logs.join("deleted_messages_2.log"));
    assert_eq!(other.len(), 1);
    assert!(other[0].contains(r#"text="two""#));

    let errors = read_lines(&logs.join("errors.log"));
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("deleted_messages_1.log"));
}

#[test]
fn concurrent_handlers_write_whole_lines() {
    const THREADS: i32 = 6;
    const PER_THREAD: i32 = 200;

    let tmp = tempfile::tempdir().unwrap();
    let logger = logger_in(tmp.path());
    let body = "multi\nline ".repeat(40);

    std::thread::scope(|s| {
        for t in 0..THREADS {
            let (logger, body) = (&logger, &body);
            s.spawn(move || {
                for i in 0..PER_THREAD {
                    logger.on_new_message(Received {
                        chat:       ChatRef::new(9, None),
                        message_id: t * PER_THREAD + i,
                        text:       body.clone(),
                        sender:     None,
                        at:         Utc::now(),
                    });
                }
            });
        }
    });

    let lines = read_lines(&tmp.path().join("received_messages_9.log"));
    assert_eq!(lines.len(), (THREADS * PER_THREAD) as usize);
    let tail = format!("| text=\"{}\"", body.replace('\n', "\\n"));
    for line in &lines {
        assert!(line.contains("| RECEIVED |"), "{line}");
        assert!(line.ends_with(&tail), "{line}");
    }
    assert!(!tmp.path().join("errors.log").exists());
}
