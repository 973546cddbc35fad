//! End-to-end CLI runs against an in-process server.

use anexo_cli::cli::Cli;
use anexo_cli::commands::execute;
use anexo_service::{AttachmentRepository, HttpService};
use clap::Parser;

async fn run(svc: &HttpService, args: &[&str]) -> (anyhow::Result<()>, String) {
    let mut argv = vec!["anexo"];
    argv.extend_from_slice(args);
    let cli = Cli::parse_from(argv);
    let mut out = Vec::new();
    let result = execute(svc, cli.command, &mut out).await;
    (result, String::from_utf8(out).unwrap())
}

fn submitted_id(output: &str) -> String {
    output
        .trim()
        .strip_prefix("Submitted ")
        .expect("submit output")
        .to_string()
}

#[tokio::test]
async fn submit_list_show_delete() {
    let server = anexo_server::test_helpers::spawn_test_server().await;
    let svc = HttpService::new(&server.base_url);

    let (result, output) = run(
        &svc,
        &[
            "submit",
            "--gde",
            "emissao",
            "--document",
            "protocolo-estagio",
            "-f",
            "dataInicioEstagio=2024-01-15",
            "-f",
            "dataFinalizacaoEstagio=2024-06-15",
            "-f",
            "empresaEstagio=deloitte",
        ],
    )
    .await;
    result.unwrap();
    let id = submitted_id(&output);

    let (result, output) = run(&svc, &["list"]).await;
    result.unwrap();
    assert!(output.contains(&id));
    assert!(output.contains("Protocolo de Estágio (Anexo II)"));

    let (result, output) = run(&svc, &["list", "--gde", "resumo"]).await;
    result.unwrap();
    assert_eq!(output, "No submissions found.\n");

    let (result, output) = run(&svc, &["show", &id]).await;
    result.unwrap();
    assert!(output.contains("empresaEstagio"));
    assert!(output.contains("deloitte"));

    let (result, output) = run(&svc, &["show", &id, "--json"]).await;
    result.unwrap();
    let payload: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(payload["gdeType"], "emissao");

    let (result, _) = run(&svc, &["delete", &id]).await;
    result.unwrap();
    let (result, _) = run(&svc, &["show", &id]).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn invalid_submission_prints_field_errors() {
    let server = anexo_server::test_helpers::spawn_test_server().await;
    let svc = HttpService::new(&server.base_url);

    let (result, output) = run(
        &svc,
        &[
            "submit",
            "--gde",
            "emissao",
            "--document",
            "protocolo-estagio",
            "-f",
            "empresaEstagio=outra",
        ],
    )
    .await;
    assert!(result.is_err());
    assert!(output.starts_with("Submission rejected:"));
    assert!(output.contains("dataInicioEstagio"));
    assert!(output.contains("nomeRepresentante"));
    assert!(svc.list_attachments().await.unwrap().is_empty());

    let (result, _) = run(&svc, &["submit", "--gde", "outro", "--document", "x"]).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn file_submission_and_download() {
    let server = anexo_server::test_helpers::spawn_test_server().await;
    let svc = HttpService::new(&server.base_url);
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("relatorio.pdf");
    std::fs::write(&source, b"%PDF-1.4 relatorio").unwrap();

    let (result, output) = run(
        &svc,
        &[
            "submit",
            "--gde",
            "submissao",
            "--document",
            "relatorio-estagio",
            "--file",
            source.to_str().unwrap(),
        ],
    )
    .await;
    result.unwrap();
    let id = submitted_id(&output);

    let (result, output) = run(&svc, &["show", &id]).await;
    result.unwrap();
    assert!(output.contains("relatorio.pdf (18 bytes)"));

    let target = dir.path().join("copy.pdf");
    let (result, _) = run(
        &svc,
        &["download", &id, "--output", target.to_str().unwrap()],
    )
    .await;
    result.unwrap();
    assert_eq!(std::fs::read(&target).unwrap(), b"%PDF-1.4 relatorio");

    // submissao without a file never reaches the server
    let (result, output) = run(
        &svc,
        &["submit", "--gde", "submissao", "--document", "relatorio-estagio"],
    )
    .await;
    assert!(result.is_err());
    assert!(output.contains("file: Arquivo é obrigatório"));
    assert_eq!(svc.list_attachments().await.unwrap().len(), 1);
}

#[tokio::test]
async fn whoami_and_catalog() {
    let (server, key) = anexo_server::test_helpers::spawn_test_server_with_auth().await;

    let anonymous = HttpService::new(&server.base_url);
    let (result, _) = run(&anonymous, &["whoami"]).await;
    assert!(result.is_err());

    let svc = HttpService::with_api_key(&server.base_url, key);
    let (result, output) = run(&svc, &["whoami"]).await;
    result.unwrap();
    assert_eq!(output, "ana\n");

    let (result, output) = run(&svc, &["catalog", "proposta-estagio"]).await;
    result.unwrap();
    assert!(output.contains("when temLocalEstagio = sim:"));

    let (result, _) = run(&svc, &["catalog", "nope"]).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn watch_prints_new_submissions() {
    let server = anexo_server::test_helpers::spawn_test_server().await;
    let base_url = server.base_url.clone();
    let mut watcher = tokio::spawn(async move {
        let svc = HttpService::new(&base_url);
        run(&svc, &["watch", "--kind", "created", "--count", "1"]).await
    });

    // The watcher subscribes asynchronously, so keep creating until it reports.
    let svc = HttpService::new(&server.base_url);
    let mut created = Vec::new();
    let (result, output) = tokio::time::timeout(std::time::Duration::from_secs(10), async {
        loop {
            if watcher.is_finished() {
                break (&mut watcher).await.unwrap();
            }
            tokio::time::sleep(std::time::Duration::from_millis(100)).await;
            let a = svc
                .create_attachment(&serde_json::json!({"gdeType": "resumo"}))
                .await
                .unwrap();
            created.push(a.id);
        }
    })
    .await
    .unwrap();

    result.unwrap();
    assert!(output.starts_with("created"), "{output}");
    assert!(created.iter().any(|id| output.contains(id.as_str())));
    assert_eq!(output.lines().count(), 1);
}
