//! Conversion of a single container.

use crate::archive::{pack_with, unpack};
use crate::convert::error::ConversionError;
use crate::convert::options::ConvertOptions;
use crate::convert::release::VersionToken;
use crate::convert::scratch::ScratchDir;
use crate::metadata::{METADATA_DOCUMENTS, VERSION_FIELDS, patch_version_fields};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Rewrites containers so that they declare a chosen release.
///
/// A `Converter` holds no state besides its options; jobs on different
/// inputs are independent of each other.
///
/// # Examples
///
/// ```no_run
/// use slx_backport::convert::{Converter, ConvertOptions, Release};
///
/// let converter = Converter::new(ConvertOptions::default());
/// let output = converter.convert_one("model.slx", &Release::R2023b.token())?;
/// println!("Created: {}", output.display());
/// # Ok::<(), slx_backport::convert::ConversionError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Converter {
    options: ConvertOptions,
}

impl Converter {
    pub fn new(options: ConvertOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ConvertOptions {
        &self.options
    }

    /// Convert the container at `input` in place and return the output path.
    ///
    /// The container is unpacked into a sibling scratch directory, each
    /// metadata document present there has its version fields set to
    /// `token`, and the tree is packed back over `input`. Documents that are
    /// absent are skipped. The scratch directory is removed before this
    /// returns, whatever the outcome; on failure `input` is left as it was.
    pub fn convert_one<P: AsRef<Path>>(&self, input: P, token: &VersionToken) -> Result<PathBuf, ConversionError> {
        let input = input.as_ref();
        let scratch_path = self
            .options
            .scratch_dir_for(input)
            .ok_or_else(|| ConversionError::NoFileName(input.to_path_buf()))?;
        let scratch = ScratchDir::create(scratch_path)?;

        unpack(input, scratch.path())?;

        for document in METADATA_DOCUMENTS {
            let doc_path = scratch.path().join(document);
            if !doc_path.is_file() {
                debug!(document, "metadata document absent");
                continue;
            }
            let changed = patch_version_fields(&doc_path, &VERSION_FIELDS, token.as_str())?;
            debug!(document, changed, "patched metadata document");
        }

        pack_with(scratch.path(), input, &self.options.pack_options())?;
        drop(scratch);

        info!(container = %input.display(), release = %token, "converted container");
        Ok(input.to_path_buf())
    }
}

/// Convert one container with default options.
///
/// See [`Converter::convert_one`].
pub fn convert_one<P: AsRef<Path>>(input: P, token: &VersionToken) -> Result<PathBuf, ConversionError> {
    Converter::default().convert_one(input, token)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::archive::{ArchiveError, Container};
    use crate::convert::release::Release;
    use crate::metadata::PatchError;
    use legacy_zip::{ArchiveWriter, FileOptions, flags};
    use proptest::prelude::*;
    use std::fs;
    use std::io::Write;

    pub(crate) const CORE_PROPERTIES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties"><cp:version>R2024b</cp:version><cp:otherVersion>9.9</cp:otherVersion></cp:coreProperties>"#;

    pub(crate) const MW_CORE_PROPERTIES: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<mwcoreProperties>
  <contentType>application/vnd.mathworks.simulink.model</contentType>
  <release>R2024b</release>
  <matlabRelease>R2024b</matlabRelease>
</mwcoreProperties>"#;

    pub(crate) const RELEASE_INFO: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<MathWorks_version_info>
  <version>24.2.0.2712019</version>
  <release>R2024b</release>
  <description>Update 1</description>
</MathWorks_version_info>"#;

    /// Build a container the way the application does: UTF-8 names with the
    /// name flag set on non-ASCII entries.
    pub(crate) fn write_container(path: &Path, entries: &[(&str, &[u8])]) {
        let file = fs::File::create(path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
        for (name, data) in entries {
            writer.start_file(*name, options).unwrap();
            writer.write_all(data).unwrap();
        }
        writer.finish().unwrap();
    }

    pub(crate) fn sample_container(path: &Path) {
        write_container(
            path,
            &[
                ("[Content_Types].xml", b"<Types/>"),
                ("metadata/coreProperties.xml", CORE_PROPERTIES.as_bytes()),
                ("metadata/mwcoreProperties.xml", MW_CORE_PROPERTIES.as_bytes()),
                ("metadata/mwcorePropertiesReleaseInfo.xml", RELEASE_INFO.as_bytes()),
                ("simulink/blockdiagram.xml", b"<ModelInformation><version>10.9</version></ModelInformation>"),
                ("simulink/systems/Übersicht.xml", "<System>Grüße</System>".as_bytes()),
            ],
        );
    }

    fn text(container: &Container, name: &str) -> String {
        String::from_utf8(container.get(name).unwrap().data().to_vec()).unwrap()
    }

    #[test]
    fn test_convert_rewrites_release_fields() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("model.slx");
        sample_container(&input);

        let output = convert_one(&input, &Release::R2023b.token()).unwrap();
        assert_eq!(output, input);

        let container = Container::open(&input).unwrap();
        let core = text(&container, "metadata/coreProperties.xml");
        assert!(core.contains("<cp:version>R2023b</cp:version>"));
        assert!(core.contains("<cp:otherVersion>9.9</cp:otherVersion>"));

        let mw = text(&container, "metadata/mwcoreProperties.xml");
        assert_eq!(mw, MW_CORE_PROPERTIES.replace("R2024b", "R2023b"));

        let info = text(&container, "metadata/mwcorePropertiesReleaseInfo.xml");
        assert!(info.contains("<version>R2023b</version>"));
        assert!(info.contains("<release>R2023b</release>"));
        assert!(info.contains("<description>Update 1</description>"));

        // Documents outside the metadata set are carried over untouched.
        assert_eq!(
            text(&container, "simulink/blockdiagram.xml"),
            "<ModelInformation><version>10.9</version></ModelInformation>"
        );
        assert_eq!(text(&container, "simulink/systems/Übersicht.xml"), "<System>Grüße</System>");
    }

    #[test]
    fn test_convert_clears_utf8_flag_and_normalises_entries() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("model.slx");
        sample_container(&input);
        let before = Container::open(&input).unwrap();
        assert!(before.get("simulink/systems/Übersicht.xml").unwrap().has_utf8_flag());

        convert_one(&input, &Release::R2022a.token()).unwrap();

        let after = Container::open(&input).unwrap();
        for entry in after.entries() {
            assert_eq!(entry.flags() & flags::UTF8_NAME, 0, "{}", entry.path());
            assert_eq!(entry.flags(), 0);
            assert!(!entry.path().contains('\\'));
            assert_eq!(entry.compression_method(), legacy_zip::CompressionMethod::Deflate);
        }
    }

    #[test]
    fn test_scratch_removed_and_no_debris() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("model.slx");
        sample_container(&input);

        convert_one(&input, &Release::R2024a.token()).unwrap();

        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, ["model.slx"]);
    }

    #[test]
    fn test_stale_scratch_is_tolerated() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("model.slx");
        sample_container(&input);
        let stale = dir.path().join("model.slx_unzipped");
        fs::create_dir_all(stale.join("metadata")).unwrap();
        fs::write(stale.join("stray.xml"), b"<left/>").unwrap();

        convert_one(&input, &Release::R2023a.token()).unwrap();

        assert!(!stale.exists());
        let container = Container::open(&input).unwrap();
        assert!(container.get("stray.xml").is_none());
    }

    #[test]
    fn test_missing_documents_are_tolerated() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("data.sldd");
        write_container(
            &input,
            &[
                ("[Content_Types].xml", b"<Types/>"),
                ("data/chunk0.mat", &[0u8, 1, 2, 3, 255]),
                ("data/名前.xml", "<v>値</v>".as_bytes()),
            ],
        );
        let before = Container::open(&input).unwrap();

        convert_one(&input, &Release::R2022b.token()).unwrap();

        let after = Container::open(&input).unwrap();
        assert_eq!(before.len(), after.len());
        for (old, new) in before.entries().iter().zip(after.entries()) {
            assert_eq!(old.path(), new.path());
            assert_eq!(old.data(), new.data());
            assert_eq!(new.flags(), 0);
        }
    }

    #[test]
    fn test_corrupted_input_fails_and_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("broken.slx");
        fs::write(&input, b"definitely not a zip archive").unwrap();

        let err = convert_one(&input, &Release::R2023b.token()).unwrap_err();
        assert!(matches!(err, ConversionError::Archive(ArchiveError::Unreadable { .. })));
        assert!(!dir.path().join("broken.slx_unzipped").exists());
        assert_eq!(fs::read(&input).unwrap(), b"definitely not a zip archive");
    }

    #[test]
    fn test_malformed_metadata_fails_and_preserves_input() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("model.slx");
        write_container(
            &input,
            &[
                ("metadata/coreProperties.xml", CORE_PROPERTIES.as_bytes()),
                ("metadata/mwcoreProperties.xml", b"<mwcoreProperties><release>R2024b</mwcoreProperties>"),
            ],
        );
        let original = fs::read(&input).unwrap();

        let err = convert_one(&input, &Release::R2023b.token()).unwrap_err();
        assert!(matches!(err, ConversionError::Patch(PatchError::MalformedXml { .. })));
        assert!(!dir.path().join("model.slx_unzipped").exists());
        assert_eq!(fs::read(&input).unwrap(), original);
    }

    #[test]
    fn test_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("absent.slx");

        let err = convert_one(&input, &Release::R2023b.token()).unwrap_err();
        assert!(matches!(err, ConversionError::Archive(ArchiveError::IoFailure { .. })));
        assert!(!dir.path().join("absent.slx_unzipped").exists());
        assert!(!input.exists());
    }

    #[test]
    fn test_input_without_file_name() {
        let err = convert_one(Path::new(".."), &Release::R2023b.token()).unwrap_err();
        assert!(matches!(err, ConversionError::NoFileName(_)));
    }

    #[test]
    fn test_custom_options_and_token() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("model.slx");
        sample_container(&input);
        let converter = Converter::new(
            ConvertOptions::new()
                .with_scratch_suffix(".work")
                .with_compression_level(0),
        );
        let token = VersionToken::new("R2099z").unwrap();

        converter.convert_one(&input, &token).unwrap();

        let container = Container::open(&input).unwrap();
        assert!(text(&container, "metadata/coreProperties.xml").contains("<cp:version>R2099z</cp:version>"));
        assert!(!dir.path().join("model.slx.work").exists());
    }

    #[test]
    fn test_repeat_conversion_is_stable() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("model.slx");
        sample_container(&input);
        let token = Release::R2023b.token();

        convert_one(&input, &token).unwrap();
        let first = Container::open(&input).unwrap();
        convert_one(&input, &token).unwrap();
        let second = Container::open(&input).unwrap();

        let first: Vec<_> = first.entries().iter().map(|e| (e.path().to_string(), e.data().to_vec())).collect();
        let second: Vec<_> = second.entries().iter().map(|e| (e.path().to_string(), e.data().to_vec())).collect();
        assert_eq!(first, second);
    }

    fn legacy_container(path: &Path, names: &[String]) {
        let mut writer = ArchiveWriter::new(Vec::new());
        for name in names {
            writer
                .write_deflated(name, name.as_bytes(), &FileOptions::default())
                .unwrap();
        }
        fs::write(path, writer.finish().unwrap()).unwrap();
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn prop_converted_names_survive_without_flag(
            names in prop::collection::btree_set("[a-zA-Z0-9_äöüßéñ模型データ]{1,10}(/[a-zA-Z0-9_äöüßéñ模型データ]{1,10})?\\.xml", 1..5)
        ) {
            let dir = tempfile::tempdir().unwrap();
            let input = dir.path().join("model.slx");
            let names: Vec<String> = names.into_iter().collect();
            legacy_container(&input, &names);

            convert_one(&input, &Release::R2023b.token()).unwrap();

            let container = Container::open(&input).unwrap();
            let mut found: Vec<String> = container.file_names().map(str::to_string).collect();
            found.sort();
            let mut expected = names.clone();
            expected.sort();
            prop_assert_eq!(found, expected);
            for entry in container.entries() {
                prop_assert_eq!(entry.flags(), 0);
                prop_assert_eq!(entry.data(), entry.path().as_bytes());
            }
        }
    }
}
