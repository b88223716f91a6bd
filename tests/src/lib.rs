//! Cross-crate scenarios, compiled against an in-memory file system rooted
//! at `/site`.

#[cfg(test)]
mod support {
    use compiler::{Options, Session, Template};
    use serde_json::Value;

    pub const BASEDIR: &str = "/site";

    /// A session with `files` loaded under `/site`.
    pub fn session(files: &[(&str, &str)]) -> Session {
        let session = Session::new();
        for (path, text) in files {
            session.files().load(format!("{}/{}", BASEDIR, path), text);
        }
        session
    }

    pub fn options() -> Options {
        Options::default().with_basedir(BASEDIR)
    }

    pub fn compile(session: &Session, path: &str) -> Template {
        session
            .compile_file(format!("{}/{}", BASEDIR, path), &options())
            .unwrap()
    }

    pub fn render(source: &str, locals: Value) -> String {
        compiler::compile(source, &options())
            .unwrap()
            .render(&locals)
            .unwrap()
            .html
    }
}

#[cfg(test)]
mod client_test;
#[cfg(test)]
mod errors_test;
#[cfg(test)]
mod inheritance_test;
#[cfg(all(test, feature = "node"))]
mod parity_test;
#[cfg(test)]
mod properties_test;
#[cfg(test)]
mod render_test;
