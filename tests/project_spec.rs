use std::fs;

use pbxpatch::manifest::{ManifestPatcher, PatchOptions, PathRewrite, SectionState, SequentialSource};
use pbxpatch::models::*;
use pbxpatch::{PatchError, Project};
use speculate2::speculate;

const FIXTURE: &str = include_str!("fixtures/app.pbxproj");

fn patcher() -> ManifestPatcher<SequentialSource> {
    ManifestPatcher::with_source(PatchOptions::default(), SequentialSource::new(0xBEEF))
}

fn files(paths: &[&str]) -> Vec<LogicalFile> {
    paths
        .iter()
        .map(|p| LogicalFile::new(*p).expect("valid path"))
        .collect()
}

speculate! {
    before {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let manifest = dir.path().join("project.pbxproj");
        fs::write(&manifest, FIXTURE).expect("Failed to write manifest");
        let project = Project::open(&manifest);
    }

    describe "register" {
        it "writes the patch and keeps the original as backup" {
            let registration = project
                .register(&mut patcher(), &files(&["Sources/Core/EventBus.swift"]))
                .expect("register failed");

            let written = fs::read_to_string(&manifest).unwrap();
            assert_eq!(written, registration.patched.text);
            assert!(written.contains("/* EventBus.swift in Sources */"));

            assert_eq!(registration.commit.backup, dir.path().join("project.pbxproj.bak"));
            assert_eq!(fs::read_to_string(&registration.commit.backup).unwrap(), FIXTURE);
            assert_eq!(registration.commit.bytes_written, written.len());
        }

        it "uses the configured backup suffix" {
            let project = project.with_backup_suffix("missing_files_backup");
            project
                .register(&mut patcher(), &files(&["Foo.swift"]))
                .expect("register failed");

            let backup = dir.path().join("project.pbxproj.missing_files_backup");
            assert_eq!(project.backup_path(), backup);
            assert_eq!(fs::read_to_string(backup).unwrap(), FIXTURE);
        }

        it "replaces the backup with the latest snapshot" {
            project
                .register(&mut patcher(), &files(&["First.swift"]))
                .expect("first register failed");
            let after_first = fs::read_to_string(&manifest).unwrap();

            project
                .register(&mut patcher(), &files(&["Second.swift"]))
                .expect("second register failed");

            assert_eq!(fs::read_to_string(project.backup_path()).unwrap(), after_first);
        }

        it "leaves the manifest and an old backup alone when a section is missing" {
            let broken = FIXTURE.replace("/* End PBXBuildFile section */", "");
            fs::write(&manifest, &broken).unwrap();
            fs::write(project.backup_path(), "older snapshot").unwrap();

            let result = project.register(&mut patcher(), &files(&["Foo.swift"]));

            assert!(matches!(result, Err(PatchError::SectionNotFound { .. })));
            assert_eq!(fs::read_to_string(&manifest).unwrap(), broken);
            assert_eq!(fs::read_to_string(project.backup_path()).unwrap(), "older snapshot");
        }

        it "does not write when the path is already registered" {
            let result = project.register(&mut patcher(), &files(&["CapsWriter-mac/AppDelegate.swift"]));

            assert!(matches!(result, Err(PatchError::DuplicatePath(_))));
            assert_eq!(fs::read_to_string(&manifest).unwrap(), FIXTURE);
            assert!(!project.backup_path().exists());
        }

        it "does not overwrite the manifest when the backup cannot be written" {
            fs::create_dir(project.backup_path()).unwrap();

            let result = project.register(&mut patcher(), &files(&["Foo.swift"]));

            match result {
                Err(err @ PatchError::BackupWriteFailed { .. }) => {
                    assert_eq!(err.backup_path(), None);
                }
                other => panic!("expected BackupWriteFailed, got {other:?}"),
            }
            assert_eq!(fs::read_to_string(&manifest).unwrap(), FIXTURE);
        }

        it "keeps the backup when the manifest cannot be replaced" {
            fs::create_dir(dir.path().join("project.pbxproj.pbxpatch-tmp")).unwrap();

            let result = project.register(&mut patcher(), &files(&["Foo.swift"]));

            match result {
                Err(err @ PatchError::CommitWriteFailed { .. }) => {
                    assert_eq!(err.backup_path(), Some(&project.backup_path()));
                }
                other => panic!("expected CommitWriteFailed, got {other:?}"),
            }
            assert_eq!(fs::read_to_string(project.backup_path()).unwrap(), FIXTURE);
            assert_eq!(fs::read_to_string(&manifest).unwrap(), FIXTURE);
        }

        it "reports an unreadable manifest" {
            let project = Project::open(dir.path().join("missing.pbxproj"));
            let result = project.register(&mut patcher(), &files(&["Foo.swift"]));
            assert!(matches!(result, Err(PatchError::ManifestRead { .. })));
        }

        it "previews without touching the disk" {
            let patched = project
                .preview(&mut patcher(), &files(&["Foo.swift"]))
                .expect("preview failed");

            assert_eq!(patched.registered.len(), 1);
            assert_eq!(fs::read_to_string(&manifest).unwrap(), FIXTURE);
            assert!(!project.backup_path().exists());
        }
    }

    describe "restore" {
        it "puts the backup back" {
            project
                .register(&mut patcher(), &files(&["Foo.swift"]))
                .expect("register failed");
            assert_ne!(fs::read_to_string(&manifest).unwrap(), FIXTURE);

            let backup = project.restore().expect("restore failed");

            assert_eq!(backup, project.backup_path());
            assert_eq!(fs::read_to_string(&manifest).unwrap(), FIXTURE);
        }

        it "fails without a backup" {
            let result = project.restore();
            assert!(matches!(result, Err(PatchError::BackupMissing { .. })));
            assert_eq!(fs::read_to_string(&manifest).unwrap(), FIXTURE);
        }
    }

    describe "rewrite" {
        it "changes only file reference paths" {
            let rules = vec![PathRewrite::Prefix {
                from: "App".into(),
                to: "Sources/App".into(),
            }];
            let (rewritten, commit) = project.rewrite(&rules).expect("rewrite failed");

            assert_eq!(rewritten.changes.len(), 2);
            assert!(rewritten.unmatched.is_empty());
            assert!(commit.is_some());

            let written = fs::read_to_string(&manifest).unwrap();
            assert!(written.contains("path = \"Sources/AppDelegate.swift\";"));
            assert!(written.contains("path = \"Sources/AppState.swift\";"));
            assert!(written.contains("path = \"CapsWriter-mac.app\";"));
            assert!(written.contains("\t\t\tpath = Sources;\n"));
            assert_eq!(fs::read_to_string(project.backup_path()).unwrap(), FIXTURE);
        }

        it "writes nothing when no rule matches" {
            let rules = vec![PathRewrite::Exact {
                from: "Nope.swift".into(),
                to: "Sources/Nope.swift".into(),
            }];
            let (rewritten, commit) = project.rewrite(&rules).expect("rewrite failed");

            assert!(rewritten.changes.is_empty());
            assert_eq!(rewritten.unmatched, rules);
            assert!(commit.is_none());
            assert_eq!(fs::read_to_string(&manifest).unwrap(), FIXTURE);
            assert!(!project.backup_path().exists());
        }
    }

    describe "sections" {
        it "reports every edited section with its entry count" {
            let report = project.sections().expect("sections failed");

            assert_eq!(
                report,
                vec![
                    (SectionKind::BuildFile, SectionState::Located { entries: 1 }),
                    (SectionKind::FileReference, SectionState::Located { entries: 3 }),
                    (SectionKind::Group, SectionState::Located { entries: 5 }),
                    (SectionKind::SourcesBuildPhase, SectionState::Located { entries: 1 }),
                ]
            );
        }

        it "lists the sections it never edits" {
            let others = project.other_sections().expect("sections failed");
            assert_eq!(others, vec!["PBXFrameworksBuildPhase", "PBXProject"]);
        }

        it "reports missing and repeated markers" {
            let text = FIXTURE
                .replace("/* Begin PBXGroup section */", "")
                .replacen(
                    "/* End PBXBuildFile section */",
                    "/* End PBXBuildFile section */\n/* End PBXBuildFile section */",
                    1,
                );
            fs::write(&manifest, text).unwrap();

            let report = project.sections().expect("sections failed");
            assert_eq!(report[0].1, SectionState::Ambiguous { count: 2 });
            assert_eq!(report[2].1, SectionState::Missing);
        }
    }
}
