#![allow(dead_code)]

pub mod temp_files {
    use std::path::PathBuf;
    use tempfile::TempDir;

    /// Writes `content` to `name` inside a fresh temporary directory.
    ///
    /// The directory is removed when the returned guard is dropped.
    pub fn write_temp(name: &str, content: &str) -> (TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        (dir, path)
    }
}

pub mod logs {
    use std::io;
    use std::sync::{Arc, Mutex};
    use tracing_subscriber::fmt::MakeWriter;

    /// Shared buffer that collects formatted log lines
    #[derive(Clone, Default)]
    pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl CapturedLogs {
        pub fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }

        pub fn lines_at(&self, level: &str) -> Vec<String> {
            self.contents()
                .lines()
                .filter(|l| l.contains(level))
                .map(str::to_string)
                .collect()
        }
    }

    pub struct CapturedWriter(Arc<Mutex<Vec<u8>>>);

    impl io::Write for CapturedWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for CapturedLogs {
        type Writer = CapturedWriter;

        fn make_writer(&'a self) -> Self::Writer {
            CapturedWriter(Arc::clone(&self.0))
        }
    }

    /// Run `f` with a thread-local subscriber writing into the returned buffer
    pub fn capture<R>(f: impl FnOnce() -> R) -> (R, CapturedLogs) {
        let logs = CapturedLogs::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(logs.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .finish();
        let out = tracing::subscriber::with_default(subscriber, f);
        (out, logs)
    }
}

pub mod pets {
    use reqcheck::Schema;
    use serde_json::json;

    pub fn new_pet() -> Schema {
        Schema::new(
            "NewPet",
            json!({
                "type": "object",
                "properties": {
                    "name": {"type": "string", "minLength": 1},
                    "age": {"type": "integer", "minimum": 0},
                    "tags": {"type": "array", "items": {"type": "string"}}
                },
                "required": ["name"],
                "additionalProperties": false
            }),
        )
        .unwrap()
    }

    pub fn pet_query() -> Schema {
        Schema::new(
            "PetQuery",
            json!({
                "type": "object",
                "properties": {
                    "limit": {"type": "integer", "default": 20},
                    "tag": {"type": "array", "items": {"type": "string"}},
                    "status": {"enum": ["available", "pending", "sold"]}
                }
            }),
        )
        .unwrap()
    }

    pub fn login_form() -> Schema {
        Schema::new(
            "LoginForm",
            json!({
                "type": "object",
                "properties": {
                    "username": {"type": "string"},
                    "remember": {"type": "boolean", "default": false}
                },
                "required": ["username"]
            }),
        )
        .unwrap()
    }
}
