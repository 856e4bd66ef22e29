//! Delivering a finished fragment.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use crate::error::BoxError;

/// Sends a fragment to its destination.
///
/// `target` identifies the destination in whatever way the publisher
/// understands: a page id for a remote content API, a path for files.
pub trait Publisher {
    fn publish(&self, fragment: &str, target: &str) -> Result<(), BoxError>;
}

impl<F> Publisher for F
where
    F: Fn(&str, &str) -> Result<(), BoxError>,
{
    fn publish(&self, fragment: &str, target: &str) -> Result<(), BoxError> {
        self(fragment, target)
    }
}

/// Writes the fragment to a file, or to stdout when the target is `-`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FilePublisher;

impl Publisher for FilePublisher {
    fn publish(&self, fragment: &str, target: &str) -> Result<(), BoxError> {
        if target == "-" {
            let mut stdout = io::stdout().lock();
            stdout.write_all(fragment.as_bytes())?;
            stdout.write_all(b"\n")?;
            stdout.flush()?;
            return Ok(());
        }

        let path = Path::new(target);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, fragment)?;
        log::info!("wrote {} bytes to {}", fragment.len(), path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;

    #[test]
    fn test_file_publisher_creates_parent() {
        let tmp = tempfile::tempdir().unwrap();
        let target = tmp.path().join("out/page.html");
        FilePublisher
            .publish("<div>x</div>", target.to_str().unwrap())
            .unwrap();
        assert_eq!(fs::read_to_string(&target).unwrap(), "<div>x</div>");
    }

    #[test]
    fn test_closure_publisher() {
        let sent = RefCell::new(Vec::new());
        let publisher = |fragment: &str, target: &str| -> Result<(), BoxError> {
            if target == "404" {
                return Err("page not found".into());
            }
            sent.borrow_mut().push((target.to_string(), fragment.len()));
            Ok(())
        };
        publisher.publish("<p>a</p>", "17").unwrap();
        assert!(publisher.publish("<p>a</p>", "404").is_err());
        assert_eq!(*sent.borrow(), vec![("17".to_string(), 8)]);
    }
}
