use crate::core::draft::DEFAULT_SHARE_BASE_URL;
use crate::domain::model::{Difficulty, QuestionFocus, QuestionFormat, QuizSettings};
use crate::utils::error::{QuizError, Result};
use crate::utils::validation::{validate_non_empty_string, validate_positive_number, validate_range, validate_url, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;

pub const DEFAULT_CONFIG_FILE: &str = "quizai.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub backend: BackendConfig,
    pub generator: GeneratorConfig,
    #[serde(default)]
    pub quiz: QuizDefaults,
    #[serde(default)]
    pub share: ShareConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    pub url: String,
    pub anon_key: String,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    pub endpoint: String,
    pub timeout_seconds: Option<u64>,
    pub max_questions: Option<u32>,
}

/// 新草稿的預設出題設定
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizDefaults {
    #[serde(default = "default_num_questions")]
    pub num_questions: u32,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub question_type: QuestionFocus,
    #[serde(default)]
    pub format: QuestionFormat,
    #[serde(default = "default_time_limit")]
    pub time_limit: u32,
}

impl Default for QuizDefaults {
    fn default() -> Self {
        Self {
            num_questions: default_num_questions(),
            difficulty: Difficulty::default(),
            question_type: QuestionFocus::default(),
            format: QuestionFormat::default(),
            time_limit: default_time_limit(),
        }
    }
}

fn default_num_questions() -> u32 {
    5
}

fn default_time_limit() -> u32 {
    30
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShareConfig {
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: Option<String>,
    #[serde(default)]
    pub json: bool,
}

impl AppConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| QuizError::ConfigError {
            message: format!("Cannot read {}: {}", path.display(), e),
        })?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| QuizError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${SUPABASE_ANON_KEY})，找不到的保留原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        static ENV_VAR: OnceLock<std::result::Result<Regex, regex::Error>> = OnceLock::new();
        let re = ENV_VAR
            .get_or_init(|| Regex::new(r"\$\{([^}]+)\}"))
            .as_ref()
            .map_err(|e| QuizError::ConfigError {
                message: format!("Invalid substitution pattern: {}", e),
            })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.into_owned())
    }

    pub fn backend_timeout(&self) -> Duration {
        Duration::from_secs(self.backend.timeout_seconds.unwrap_or(30))
    }

    pub fn generator_timeout(&self) -> Duration {
        Duration::from_secs(self.generator.timeout_seconds.unwrap_or(120))
    }

    pub fn max_questions(&self) -> u32 {
        self.generator.max_questions.unwrap_or(50)
    }

    pub fn share_base_url(&self) -> &str {
        self.share.base_url.as_deref().unwrap_or(DEFAULT_SHARE_BASE_URL)
    }

    pub fn log_level(&self) -> &str {
        self.logging.level.as_deref().unwrap_or("info")
    }

    /// 以 `[quiz]` 區段建立草稿設定（標題留空）
    pub fn default_settings(&self) -> QuizSettings {
        QuizSettings {
            num_questions: self.quiz.num_questions,
            difficulty: self.quiz.difficulty,
            question_type: self.quiz.question_type,
            format: self.quiz.format,
            time_limit: self.quiz.time_limit,
            ..QuizSettings::default()
        }
    }
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        validate_url("backend.url", &self.backend.url)?;
        validate_non_empty_string("backend.anon_key", &self.backend.anon_key)?;
        if self.backend.anon_key.contains("${") {
            return Err(QuizError::ConfigValidationError {
                field: "backend.anon_key".to_string(),
                message: format!("Unresolved environment variable: {}", self.backend.anon_key),
            });
        }
        if let Some(timeout) = self.backend.timeout_seconds {
            validate_positive_number("backend.timeout_seconds", timeout, 1)?;
        }

        validate_url("generator.endpoint", &self.generator.endpoint)?;
        if let Some(timeout) = self.generator.timeout_seconds {
            validate_positive_number("generator.timeout_seconds", timeout, 1)?;
        }
        validate_positive_number("generator.max_questions", u64::from(self.max_questions()), 1)?;

        validate_range(
            "quiz.num_questions",
            u64::from(self.quiz.num_questions),
            1,
            u64::from(self.max_questions()),
        )?;
        validate_positive_number("quiz.time_limit", u64::from(self.quiz.time_limit), 1)?;

        if let Some(base_url) = &self.share.base_url {
            validate_url("share.base_url", base_url)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const MINIMAL: &str = r#"
[backend]
url = "https://project.supabase.co"
anon_key = "anon-key"

[generator]
endpoint = "http://localhost:3000/api/generate-questions"
"#;

    #[test]
    fn test_parse_minimal_config_defaults() {
        let config = AppConfig::from_toml_str(MINIMAL).unwrap();

        assert_eq!(config.backend.url, "https://project.supabase.co");
        assert_eq!(config.backend_timeout(), Duration::from_secs(30));
        assert_eq!(config.generator_timeout(), Duration::from_secs(120));
        assert_eq!(config.max_questions(), 50);
        assert_eq!(config.share_base_url(), DEFAULT_SHARE_BASE_URL);
        assert_eq!(config.log_level(), "info");
        assert!(!config.logging.json);
        assert!(config.validate().is_ok());

        let settings = config.default_settings();
        assert_eq!(settings.num_questions, 5);
        assert_eq!(settings.time_limit, 30);
        assert!(settings.title.is_empty());
    }

    #[test]
    fn test_parse_quiz_defaults() {
        let toml_content = format!(
            "{}\n[quiz]\nnum_questions = 10\ndifficulty = \"hard\"\nquestion_type = \"theory\"\nformat = \"true_false\"\n\n[share]\nbase_url = \"https://quiz.school.edu/q\"\n",
            MINIMAL
        );
        let config = AppConfig::from_toml_str(&toml_content).unwrap();
        let settings = config.default_settings();

        assert_eq!(settings.num_questions, 10);
        assert_eq!(settings.difficulty, Difficulty::Hard);
        assert_eq!(settings.question_type, QuestionFocus::Theory);
        assert_eq!(settings.format, QuestionFormat::TrueFalse);
        assert_eq!(settings.time_limit, 30);
        assert_eq!(config.share_base_url(), "https://quiz.school.edu/q");
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("QUIZAI_TEST_ANON_KEY", "from-env");

        let toml_content = MINIMAL.replace("\"anon-key\"", "\"${QUIZAI_TEST_ANON_KEY}\"");
        let config = AppConfig::from_toml_str(&toml_content).unwrap();
        assert_eq!(config.backend.anon_key, "from-env");

        std::env::remove_var("QUIZAI_TEST_ANON_KEY");
    }

    #[test]
    fn test_unresolved_env_var_fails_validation() {
        let toml_content = MINIMAL.replace("\"anon-key\"", "\"${QUIZAI_TEST_MISSING_KEY}\"");
        let config = AppConfig::from_toml_str(&toml_content).unwrap();

        assert_eq!(config.backend.anon_key, "${QUIZAI_TEST_MISSING_KEY}");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation() {
        let bad_url = MINIMAL.replace("https://project.supabase.co", "project.supabase.co");
        assert!(AppConfig::from_toml_str(&bad_url).unwrap().validate().is_err());

        let too_many = format!("{}\n[quiz]\nnum_questions = 80\n", MINIMAL);
        let err = AppConfig::from_toml_str(&too_many).unwrap().validate().unwrap_err();
        assert!(err.to_string().contains("quiz.num_questions"));

        let zero_timeout = MINIMAL.replace("anon_key = \"anon-key\"", "anon_key = \"anon-key\"\ntimeout_seconds = 0");
        assert!(AppConfig::from_toml_str(&zero_timeout).unwrap().validate().is_err());
    }

    #[test]
    fn test_missing_section_is_parse_error() {
        let err = AppConfig::from_toml_str("[backend]\nurl = \"https://x.co\"\nanon_key = \"k\"\n").unwrap_err();
        assert!(matches!(err, QuizError::ConfigValidationError { .. }));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(MINIMAL.as_bytes()).unwrap();

        let config = AppConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.generator.endpoint, "http://localhost:3000/api/generate-questions");

        assert!(matches!(
            AppConfig::from_file("/nonexistent/quizai.toml"),
            Err(QuizError::ConfigError { .. })
        ));
    }
}
