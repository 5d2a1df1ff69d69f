use campaign_advisor::model::encoding::{interest_count, interest_flags};
use campaign_advisor::model::{
    DecisionTree, LabelEncoder, RandomForestClassifier, RandomForestRegressor, StandardScaler,
    TreeNode,
};
use campaign_advisor::PredictionError;

fn stump(threshold: f64, left: Vec<f64>, right: Vec<f64>) -> DecisionTree {
    DecisionTree::from_nodes(vec![
        TreeNode::Split {
            feature: 0,
            threshold,
            left: 1,
            right: 2,
        },
        TreeNode::Leaf { value: left },
        TreeNode::Leaf { value: right },
    ])
}

#[test]
fn classifier_averages_tree_distributions() {
    let forest = RandomForestClassifier::new(
        2,
        vec![
            stump(0.5, vec![1.0, 0.0], vec![0.0, 1.0]),
            stump(1.5, vec![1.0, 0.0], vec![0.0, 1.0]),
        ],
    );

    let (class, probabilities) = forest.predict(&[1.0]).unwrap();
    assert_eq!(probabilities, vec![0.5, 0.5]);
    assert_eq!(class, 0);

    let (class, _) = forest.predict(&[2.0]).unwrap();
    assert_eq!(class, 1);
}

#[test]
fn regressor_returns_mean_leaf() {
    let forest = RandomForestRegressor::new(vec![
        stump(0.0, vec![1.0], vec![3.0]),
        stump(0.0, vec![2.0], vec![5.0]),
    ]);
    assert_eq!(forest.predict(&[1.0]).unwrap(), 4.0);
    assert_eq!(forest.predict(&[-1.0]).unwrap(), 1.5);
}

#[test]
fn malformed_trees_are_reported() {
    let cyclic = DecisionTree::from_nodes(vec![TreeNode::Split {
        feature: 0,
        threshold: 0.0,
        left: 0,
        right: 0,
    }]);
    assert_eq!(cyclic.nodes().len(), 1);
    assert!(matches!(cyclic.leaf(&[1.0]), Err(PredictionError::MalformedTree(_))));

    let dangling = stump(0.0, vec![1.0], vec![2.0]);
    assert!(matches!(
        dangling.leaf(&[]),
        Err(PredictionError::FeatureMismatch { .. })
    ));

    let wrong_width =
        RandomForestClassifier::new(3, vec![stump(0.0, vec![1.0, 0.0], vec![0.0, 1.0])]);
    assert!(wrong_width.predict(&[1.0]).is_err());
    assert!(RandomForestRegressor::new(Vec::new()).predict(&[1.0]).is_err());
}

#[test]
fn encoders_reject_unseen_values() {
    let encoder =
        LabelEncoder::from_classes(vec!["b".to_string(), "a".to_string(), "a".to_string()]);
    assert_eq!(encoder.classes(), ["a", "b"]);
    assert_eq!(encoder.transform("location", "b").unwrap(), 1);
    assert_eq!(
        encoder.transform("location", "c"),
        Err(PredictionError::UnseenCategory {
            column: "location",
            value: "c".to_string()
        })
    );
    assert!(encoder.inverse_transform(2).is_err());
}

#[test]
fn scaler_checks_width() {
    let scaler = StandardScaler::new(vec![1.0, 2.0], vec![2.0, 1.0]);
    assert_eq!(scaler.transform(&[3.0, 2.0]).unwrap(), vec![1.0, 0.0]);
    assert!(matches!(
        scaler.transform(&[1.0]),
        Err(PredictionError::FeatureMismatch { expected: 2, actual: 1 })
    ));
}

#[test]
fn interest_features_match_substrings() {
    assert_eq!(interest_count(""), 1);
    assert_eq!(interest_count("technology;fitness"), 2);
    let flags = interest_flags("Fitness; HEALTH tech");
    assert_eq!(flags, [false, false, true, false, true, false, false]);
}
