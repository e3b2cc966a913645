//! 发音预处理
//!
//! 把标题转换成 TTS 更容易正确朗读的形式：短的全大写字母词
//! （股票代码、缩写）按字母拆开，让合成引擎逐个拼读。

/// 逐字母拼读的最大长度
pub const MAX_SPELLED_LEN: usize = 5;

/// 判断是否为需要拼读的词：全字母、全大写、不超过 5 个字符
#[inline]
fn should_spell(word: &str) -> bool {
    let len = word.chars().count();
    len > 0
        && len <= MAX_SPELLED_LEN
        && word.chars().all(char::is_alphabetic)
        && word.chars().any(char::is_uppercase)
        && !word.chars().any(char::is_lowercase)
}

/// 拼读单个词（NVDA -> N-V-D-A），不满足条件的词原样返回
pub fn spell(word: &str) -> String {
    if !should_spell(word) {
        return word.to_string();
    }

    word.chars()
        .map(String::from)
        .collect::<Vec<_>>()
        .join("-")
}

/// 对整条标题做拼读转换，词之间以单个空格连接
pub fn pronounceable(title: &str) -> String {
    title
        .split_whitespace()
        .map(spell)
        .collect::<Vec<_>>()
        .join(" ")
}

/// 转换并包裹为合成服务接受的最小 SSML
pub fn to_ssml(title: &str) -> String {
    format!("<speak>{}</speak>", pronounceable(title))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ticker_is_spelled() {
        assert_eq!(spell("NVDA"), "N-V-D-A");
        assert_eq!(spell("AI"), "A-I");
        assert_eq!(spell("AAPLX"), "A-A-P-L-X");
    }

    #[test]
    fn test_non_matching_words_pass_through() {
        assert_eq!(spell("Nvidia"), "Nvidia");
        assert_eq!(spell("AI2X9"), "AI2X9");
        assert_eq!(spell("A"), "A");
        // 超过 5 个字母
        assert_eq!(spell("NASDAQ"), "NASDAQ");
        // 标点不是字母
        assert_eq!(spell("U.S."), "U.S.");
        assert_eq!(spell("AT&T"), "AT&T");
    }

    #[test]
    fn test_title_transformation() {
        assert_eq!(
            pronounceable("NVDA rallies as Nvidia beats   estimates"),
            "N-V-D-A rallies as Nvidia beats estimates"
        );
    }

    #[test]
    fn test_ssml_wrapping() {
        assert_eq!(
            to_ssml("IBM and GE report earnings"),
            "<speak>I-B-M and G-E report earnings</speak>"
        );
        assert_eq!(to_ssml(""), "<speak></speak>");
    }
}
