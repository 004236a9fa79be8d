//! End-to-end tests for the issue area predictor against the bundled dataset

use issue_classifier::{
    ClassifierConfig, GitHubIssue, IssueDataset, Predictor, PredictorError, PredictorState,
    TrainedModel,
};
use std::path::PathBuf;

const DATA_TABLE_TITLE: &str = "DataTable not updating Database with DataAdapter";
const DATA_TABLE_DESCRIPTION: &str = "I am trying to update a database with info from a WinForm. \
I had no issues when using a “normal” SQL update command written by hand (parameters set to the text \
box values,) but I am trying to clean up and reduce my code and I thought I would bind the controls \
to a DataTable and use a DataAdapter's update command to achieve the same thing. I have tried to get \
various combinations of setting parameters and update commands to work, but the Database is not \
getting updated from the new DataTable values. I have stepped through the code with each change and \
can see that the DataTable is getting the new textbox values, but those updates aren’t going to the Database.";

fn data_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data").join(name)
}

fn trained_predictor() -> Predictor {
    let mut predictor = Predictor::new();
    predictor.load_train_data(data_path("issues_train.tsv")).unwrap();
    predictor.build_and_train_model().unwrap();
    predictor
}

#[test]
fn test_evaluate_model_accuracy_in_range() {
    let mut predictor = trained_predictor();
    predictor.load_test_data(data_path("issues_test.tsv")).unwrap();

    let metrics = predictor.evaluate_model_metrics().unwrap();
    assert!(
        (0.5..=0.95).contains(&metrics.micro_accuracy),
        "micro accuracy {}",
        metrics.micro_accuracy
    );
    assert!(
        (0.5..=0.95).contains(&metrics.macro_accuracy),
        "macro accuracy {}",
        metrics.macro_accuracy
    );
    assert!(metrics.log_loss >= 0.0);
    assert!(metrics.log_loss_reduction <= 1.0);
    assert_eq!(metrics.skipped_rows, 0);
    assert_eq!(metrics.evaluated_rows, predictor.test_data().unwrap().len());
}

#[test]
fn test_predict_area_system_data() {
    let predictor = trained_predictor();
    let area = predictor.predict(DATA_TABLE_TITLE, DATA_TABLE_DESCRIPTION).unwrap();
    assert_eq!(area, "area-System.Data");
}

#[test]
fn test_predict_after_save_and_reload() {
    let dir = tempfile::tempdir().unwrap();
    let model_path = dir.path().join("TheModel.model");

    let mut predictor = trained_predictor();
    let before = predictor
        .predict_detailed(DATA_TABLE_TITLE, DATA_TABLE_DESCRIPTION)
        .unwrap();
    predictor.save_model(&model_path).unwrap();
    predictor.load_model(&model_path).unwrap();

    let after = predictor
        .predict_detailed(DATA_TABLE_TITLE, DATA_TABLE_DESCRIPTION)
        .unwrap();
    assert_eq!(after.predicted_area, "area-System.Data");
    assert_eq!(after, before);
}

#[test]
fn test_loaded_model_predicts_without_data() {
    let dir = tempfile::tempdir().unwrap();
    let model_path = dir.path().join("issues.model");
    trained_predictor().save_model(&model_path).unwrap();

    let mut fresh = Predictor::new();
    assert_eq!(fresh.state(), PredictorState::Uninitialized);
    fresh.load_model(&model_path).unwrap();
    assert_eq!(fresh.state(), PredictorState::ModelReady);
    assert!(fresh.train_data().is_none());

    let area = fresh.predict(DATA_TABLE_TITLE, DATA_TABLE_DESCRIPTION).unwrap();
    assert_eq!(area, "area-System.Data");

    // saving a reloaded model works without ever loading data
    let copy_path = dir.path().join("copy.model");
    fresh.save_model(&copy_path).unwrap();
    let copy = TrainedModel::load(&copy_path).unwrap();
    assert_eq!(copy.labels(), fresh.model().unwrap().labels());
    assert_eq!(copy.schema(), &IssueDataset::schema());
}

#[test]
fn test_save_overwrites_existing_file() {
    let dir = tempfile::tempdir().unwrap();
    let model_path = dir.path().join("issues.model");
    std::fs::write(&model_path, b"previous contents").unwrap();

    trained_predictor().save_model(&model_path).unwrap();
    assert!(TrainedModel::load(&model_path).is_ok());
}

#[test]
fn test_every_prediction_is_a_training_area() {
    let predictor = trained_predictor();
    let model = predictor.model().unwrap();
    let areas = model.labels();
    assert_eq!(areas.len(), 8);

    for (title, description) in [
        ("", ""),
        ("HttpClient socket timeout", ""),
        ("", "JsonSerializer throws for enum dictionary keys"),
        ("????", "!!! ... ###"),
    ] {
        let prediction = predictor.predict_detailed(title, description).unwrap();
        assert!(areas.contains(&prediction.predicted_area), "{title:?} / {description:?}");
        assert_eq!(prediction.scores.len(), areas.len());
        let total: f32 = prediction.scores.iter().sum();
        assert!((total - 1.0).abs() < 1e-4);
    }
}

#[test]
fn test_predictions_follow_vocabulary() {
    let predictor = trained_predictor();
    assert_eq!(
        predictor
            .predict("SslStream TLS handshake fails", "HttpClient socket connection to HTTPS server")
            .unwrap(),
        "area-System.Net"
    );
    assert_eq!(
        predictor
            .predict("SemaphoreSlim deadlock", "async task waits on the thread pool thread forever")
            .unwrap(),
        "area-System.Threading"
    );
}

#[test]
fn test_training_is_deterministic() {
    let a = trained_predictor();
    let b = trained_predictor();
    let pa = a.predict_detailed(DATA_TABLE_TITLE, DATA_TABLE_DESCRIPTION).unwrap();
    let pb = b.predict_detailed(DATA_TABLE_TITLE, DATA_TABLE_DESCRIPTION).unwrap();
    assert_eq!(pa, pb);
}

#[test]
fn test_reloading_train_data_replaces_rows() {
    let mut predictor = Predictor::new();
    let first = predictor.load_train_data(data_path("issues_train.tsv")).unwrap();
    let second = predictor.load_train_data(data_path("issues_train.tsv")).unwrap();
    assert_eq!(first, second);
    assert_eq!(predictor.train_data().unwrap().len(), first);
    assert_eq!(predictor.state(), PredictorState::DataLoaded);
}

#[test]
fn test_evaluate_requires_test_data() {
    let predictor = trained_predictor();
    let err = predictor.evaluate_model_metrics().unwrap_err();
    assert!(matches!(err, PredictorError::NotReady { .. }));
    assert!(err.to_string().contains("load test data"));
}

#[test]
fn test_missing_column_is_schema_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.tsv");
    std::fs::write(&path, "ID\tTitle\tDescription\n1\tCrash\tStack trace\n").unwrap();

    let mut predictor = Predictor::new();
    let err = predictor.load_train_data(&path).unwrap_err();
    assert!(matches!(err, PredictorError::Schema { .. }));
    assert!(err.to_string().contains("Area"));
    assert_eq!(predictor.state(), PredictorState::Uninitialized);
}

#[test]
fn test_missing_file_is_io_error() {
    let mut predictor = Predictor::new();
    let err = predictor
        .load_test_data(data_path("does_not_exist.tsv"))
        .unwrap_err();
    assert!(matches!(err, PredictorError::Io { .. }));
}

#[test]
fn test_single_area_cannot_train() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("one_area.tsv");
    std::fs::write(
        &path,
        "Area\tTitle\tDescription\n\
         area-System.IO\tFile locked\tCannot open file\n\
         area-System.IO\tPath too long\tPath exceeds limit\n",
    )
    .unwrap();

    let mut predictor = Predictor::new();
    predictor.load_train_data(&path).unwrap();
    assert!(predictor.build_and_train_model().is_err());
    assert!(predictor.model().is_none());
}

#[test]
fn test_divergent_training_is_rejected() {
    let mut config = ClassifierConfig::default();
    config.trainer.learning_rate = 1e30;
    let mut predictor = Predictor::with_config(config).unwrap();
    predictor.load_train_data(data_path("issues_train.tsv")).unwrap();

    let err = predictor.build_and_train_model().unwrap_err();
    assert!(matches!(err, PredictorError::Pipeline(_)));
    assert!(predictor.model().is_none());
    assert!(matches!(
        predictor.predict(DATA_TABLE_TITLE, DATA_TABLE_DESCRIPTION),
        Err(PredictorError::NotReady { .. })
    ));
}

#[test]
fn test_corrupted_model_file_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("corrupt.model");
    trained_predictor().save_model(&path).unwrap();

    let mut bytes = std::fs::read(&path).unwrap();
    let mid = bytes.len() / 2;
    bytes[mid] ^= 0x5a;
    std::fs::write(&path, &bytes).unwrap();

    let mut predictor = Predictor::new();
    let err = predictor.load_model(&path).unwrap_err();
    assert!(matches!(err, PredictorError::ModelFormat(_)));
    assert!(predictor.model().is_none());
}

#[test]
fn test_trained_model_batch_prediction() {
    let predictor = trained_predictor();
    let model = predictor.model().unwrap();
    let issues = vec![
        GitHubIssue::unlabeled(DATA_TABLE_TITLE, DATA_TABLE_DESCRIPTION),
        GitHubIssue::unlabeled("File.Move fails", "moving a file to another volume throws IOException"),
    ];
    let predictions = model.predict_batch(&issues).unwrap();
    assert_eq!(predictions.len(), 2);
    assert_eq!(predictions[0].predicted_area, "area-System.Data");
    assert_eq!(predictions[1].predicted_area, "area-System.IO");
}

#[test]
fn test_custom_config_top_k() {
    let mut config = ClassifierConfig::default();
    config.evaluation.top_k = Some(3);
    let mut predictor = Predictor::with_config(config).unwrap();
    predictor.load_train_data(data_path("issues_train.tsv")).unwrap();
    predictor.load_test_data(data_path("issues_test.tsv")).unwrap();
    predictor.build_and_train_model().unwrap();

    let metrics = predictor.evaluate_model_metrics().unwrap();
    assert_eq!(metrics.top_k, Some(3));
    let top_k = metrics.top_k_accuracy.unwrap();
    assert!(top_k >= metrics.micro_accuracy);
}
