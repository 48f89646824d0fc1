//! End-to-end scan tests over an in-process fake mailbox.
//!
//! These drive the full pipeline (search, pre-filter, fetch, extract,
//! classify, persist, archive) without a real mail server.

use async_trait::async_trait;

use cvtriage::mailbox::error::Result as MailboxResult;
use cvtriage::mailbox::{
    Attachment, FolderCounts, MailMessage, MailboxConnector, MessageRef, SearchWindow,
};
use cvtriage::scoring::{GenericKeywords, KeywordScorer, Status};
use cvtriage::store::{profile_repo, result_repo};
use cvtriage::{
    AbbreviationTable, CancelToken, CandidateClassifier, Database, FilesystemArchive,
    PipelineConfig, ScanRunner, ScoringConfig,
};

struct FakeMailbox {
    messages: Vec<MailMessage>,
    structure_probes: std::sync::atomic::AtomicU32,
    fetches: std::sync::atomic::AtomicU32,
}

impl FakeMailbox {
    fn new(messages: Vec<MailMessage>) -> Self {
        Self {
            messages,
            structure_probes: Default::default(),
            fetches: Default::default(),
        }
    }

    fn fetch_count(&self) -> u32 {
        self.fetches.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[async_trait]
impl MailboxConnector for FakeMailbox {
    async fn connect(&mut self) -> MailboxResult<()> {
        Ok(())
    }

    async fn search(&mut self, _window: &SearchWindow) -> MailboxResult<Vec<MessageRef>> {
        Ok((0..self.messages.len())
            .map(|i| MessageRef { id: i.to_string() })
            .collect())
    }

    async fn has_candidate_attachments(&mut self, message: &MessageRef) -> MailboxResult<bool> {
        self.structure_probes
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        let index: usize = message.id.parse().unwrap();
        Ok(!self.messages[index].attachments.is_empty())
    }

    async fn fetch(&mut self, message: &MessageRef) -> MailboxResult<MailMessage> {
        self.fetches
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        let index: usize = message.id.parse().unwrap();
        Ok(self.messages[index].clone())
    }

    async fn folder_counts(&mut self) -> MailboxResult<Option<FolderCounts>> {
        Ok(None)
    }

    async fn disconnect(&mut self) -> MailboxResult<()> {
        Ok(())
    }
}

fn txt_attachment(name: &str, text: &str) -> Attachment {
    Attachment {
        file_name: name.to_string(),
        mime_type: "text/plain".to_string(),
        data: text.as_bytes().to_vec(),
    }
}

fn message(sender: &str, subject: &str, attachments: Vec<Attachment>) -> MailMessage {
    MailMessage {
        sender_email: sender.to_string(),
        subject: subject.to_string(),
        message_date: format!("Mon, 05 Jan 2026 10:00:00 +0000 ({})", sender),
        attachments,
    }
}

const STRONG_RESUME: &str = "Graduação em administração pela universidade, curso superior \
    completo. Cinco anos de experiência de trabalho como analista de RH, cargo \
    com responsabilidade. Conhecimento e domínio de informática.";

const WEAK_TEXT: &str = "bom dia, segue anexo";

fn build_runner(db: &Database, batch_size: usize) -> ScanRunner {
    let classifier = CandidateClassifier::new(
        KeywordScorer::new(AbbreviationTable::builtin()),
        GenericKeywords::builtin(),
        ScoringConfig::default(),
    );
    let config = PipelineConfig {
        batch_size,
        batch_pause_ms: 0,
        search_cap: 1000,
    };
    ScanRunner::new(config, classifier, db.clone())
}

#[tokio::test]
async fn scan_classifies_and_persists_each_message_once() {
    let db = Database::open_in_memory().unwrap();
    let runner = build_runner(&db, 100);

    let mut mailbox = FakeMailbox::new(vec![
        message(
            "joana@example.com",
            "Candidatura - Analista",
            vec![txt_attachment("curriculo.txt", STRONG_RESUME)],
        ),
        message(
            "spam@example.com",
            "Oferta imperdível",
            vec![txt_attachment("nota.txt", WEAK_TEXT)],
        ),
        // No attachments at all: the pre-filter must stop the fetch.
        message("vazio@example.com", "Sem anexos", vec![]),
    ]);

    let report = runner
        .run(&mut mailbox, SearchWindow::default(), None, &CancelToken::new())
        .await
        .unwrap();

    assert_eq!(report.processed, 2);
    assert_eq!(report.skipped, 1);
    assert_eq!(report.errored, 0);
    // The attachment-less message was never downloaded.
    assert_eq!(mailbox.fetch_count(), 2);

    let stats = result_repo::stats(&db).unwrap();
    assert_eq!(stats.total, 2);
    assert_eq!(stats.approved, 1);

    // Second scan of the same mailbox changes nothing.
    let rescan = runner
        .run(&mut mailbox, SearchWindow::default(), None, &CancelToken::new())
        .await
        .unwrap();
    assert_eq!(rescan.processed, 0);
    assert_eq!(rescan.skipped, 3);
    assert_eq!(result_repo::stats(&db).unwrap().total, 2);
}

#[tokio::test]
async fn gate_rejects_resumes_unrelated_to_the_profile() {
    let db = Database::open_in_memory().unwrap();
    let runner = build_runner(&db, 100);

    let profile = profile_repo::save(
        &db,
        "Desenvolvedor",
        &["java".to_string(), "python".to_string(), "sql".to_string()],
    )
    .unwrap();

    let mut mailbox = FakeMailbox::new(vec![message(
        "joana@example.com",
        "Candidatura",
        vec![txt_attachment("curriculo.txt", STRONG_RESUME)],
    )]);

    let report = runner
        .run(
            &mut mailbox,
            SearchWindow::default(),
            Some(&profile),
            &CancelToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(report.processed, 1);
    let rejected = result_repo::list_by_status(&db, Status::Rejected).unwrap();
    assert_eq!(rejected.len(), 1);
    assert_eq!(rejected[0].final_score, 0.0);
    assert_eq!(rejected[0].job_profile_id, Some(profile.id));
}

#[tokio::test]
async fn profile_keywords_with_abbreviations_approve_matching_resume() {
    let db = Database::open_in_memory().unwrap();
    let runner = build_runner(&db, 100);

    // "recursos humanos" matches through the rh abbreviation in the text.
    let profile = profile_repo::save(
        &db,
        "Analista de RH",
        &[
            "recursos humanos".to_string(),
            "administração".to_string(),
            "analista".to_string(),
        ],
    )
    .unwrap();

    let mut mailbox = FakeMailbox::new(vec![message(
        "joana@example.com",
        "Candidatura",
        vec![txt_attachment("curriculo.txt", STRONG_RESUME)],
    )]);

    runner
        .run(
            &mut mailbox,
            SearchWindow::default(),
            Some(&profile),
            &CancelToken::new(),
        )
        .await
        .unwrap();

    let approved = result_repo::list_by_status(&db, Status::Approved).unwrap();
    assert_eq!(approved.len(), 1);

    db.with_conn(|conn| {
        let count: u32 = conn.query_row(
            "SELECT COUNT(*) FROM approved_candidates WHERE job_profile_id = ?1",
            [profile.id],
            |r| r.get(0),
        )?;
        assert_eq!(count, 1);
        Ok(())
    })
    .unwrap();
}

#[tokio::test]
async fn multiple_attachments_average_into_the_message_score() {
    let db = Database::open_in_memory().unwrap();
    let runner = build_runner(&db, 100);

    let mut single_strong = FakeMailbox::new(vec![message(
        "a@example.com",
        "cv",
        vec![txt_attachment("cv.txt", STRONG_RESUME)],
    )]);
    let mut single_weak = FakeMailbox::new(vec![message(
        "b@example.com",
        "cv",
        vec![txt_attachment("cv.txt", WEAK_TEXT)],
    )]);
    let mut both = FakeMailbox::new(vec![message(
        "c@example.com",
        "cv",
        vec![
            txt_attachment("forte.txt", STRONG_RESUME),
            txt_attachment("fraco.txt", WEAK_TEXT),
        ],
    )]);

    for mailbox in [&mut single_strong, &mut single_weak, &mut both] {
        runner
            .run(mailbox, SearchWindow::default(), None, &CancelToken::new())
            .await
            .unwrap();
    }

    let score_of = |sender: &str| -> f64 {
        db.with_conn(|conn| {
            let score: f64 = conn.query_row(
                "SELECT final_score FROM results WHERE sender_email = ?1",
                [sender],
                |r| r.get(0),
            )?;
            Ok(score)
        })
        .unwrap()
    };

    let strong = score_of("a@example.com");
    let weak = score_of("b@example.com");
    let combined = score_of("c@example.com");
    assert!((combined - (strong + weak) / 2.0).abs() < 1e-9);
}

#[tokio::test]
async fn archive_receives_attachments_routed_by_status() {
    let db = Database::open_in_memory().unwrap();
    let archive_dir = tempfile::tempdir().unwrap();

    let runner = build_runner(&db, 100)
        .with_archive(Box::new(FilesystemArchive::new(archive_dir.path())));

    let mut mailbox = FakeMailbox::new(vec![
        message(
            "joana@example.com",
            "Candidatura",
            vec![txt_attachment("curriculo.txt", STRONG_RESUME)],
        ),
        message(
            "spam@example.com",
            "Oferta",
            vec![txt_attachment("nota.txt", WEAK_TEXT)],
        ),
    ]);

    runner
        .run(&mut mailbox, SearchWindow::default(), None, &CancelToken::new())
        .await
        .unwrap();

    let approved = archive_dir
        .path()
        .join("approved")
        .join("joana@example.com")
        .join("curriculo.txt");
    assert!(approved.exists());
    assert_eq!(std::fs::read_to_string(&approved).unwrap(), STRONG_RESUME);

    assert!(!archive_dir
        .path()
        .join("approved")
        .join("spam@example.com")
        .exists());
}

#[tokio::test]
async fn legacy_doc_attachments_yield_error_status() {
    let db = Database::open_in_memory().unwrap();
    let runner = build_runner(&db, 100);

    let mut mailbox = FakeMailbox::new(vec![message(
        "antigo@example.com",
        "Candidatura",
        vec![Attachment {
            file_name: "curriculo.doc".to_string(),
            mime_type: "application/msword".to_string(),
            data: b"\xd0\xcf\x11\xe0legacy".to_vec(),
        }],
    )]);

    let report = runner
        .run(&mut mailbox, SearchWindow::default(), None, &CancelToken::new())
        .await
        .unwrap();

    assert_eq!(report.processed, 1);
    let errored = result_repo::list_by_status(&db, Status::Error).unwrap();
    assert_eq!(errored.len(), 1);
    assert_eq!(errored[0].final_score, 0.0);
}

#[tokio::test]
async fn small_batches_cover_the_whole_result_set() {
    let db = Database::open_in_memory().unwrap();
    let runner = build_runner(&db, 2);

    let messages: Vec<MailMessage> = (0..5)
        .map(|i| {
            message(
                &format!("c{}@example.com", i),
                "Candidatura",
                vec![txt_attachment("cv.txt", STRONG_RESUME)],
            )
        })
        .collect();
    let mut mailbox = FakeMailbox::new(messages);

    let report = runner
        .run(&mut mailbox, SearchWindow::default(), None, &CancelToken::new())
        .await
        .unwrap();

    assert_eq!(report.processed, 5);
    assert_eq!(result_repo::stats(&db).unwrap().total, 5);
}
